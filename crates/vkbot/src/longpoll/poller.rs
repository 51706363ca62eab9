//! The poll loop state machine and its continuous-listen driver.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use vkbot_types::Event;

use crate::client::{Client, MethodCaller, Transport};
use crate::config::LongPollConfig;

use super::dispatch::{EventHandler, dispatch};
use super::error::{FetchError, UpstreamError};
use super::server::{self, LongPollServer, parse_ts};
use super::session::{PollState, SessionState, Wait};

// ============================================================================
// Cycle
// ============================================================================

/// The result of one [`LongPoll::step`], i.e. one state transition.
#[derive(Debug)]
pub enum Cycle {
    /// Fetch succeeded; the cursor moved to the response's `ts`.
    Events(Vec<Event>),
    /// `failed: 1`. The cursor was replaced with the server's value.
    HistoryOutdated { ts: u64 },
    /// `failed: 2` or `failed: 3`. The session must be re-acquired.
    SessionExpired { code: i64 },
    /// The fetch failed or returned something unusable. The session must
    /// be re-acquired.
    TransportFailure(FetchError),
    /// A new server was acquired and committed.
    Acquired,
    /// Acquisition failed; the state is unchanged.
    AcquisitionFailed(UpstreamError),
}

impl Cycle {
    pub fn events(&self) -> &[Event] {
        match self {
            Cycle::Events(events) => events,
            _ => &[],
        }
    }

    pub fn into_events(self) -> Vec<Event> {
        match self {
            Cycle::Events(events) => events,
            _ => Vec::new(),
        }
    }

    /// Whether the listen driver should pause before the next cycle.
    pub fn needs_backoff(&self) -> bool {
        matches!(
            self,
            Cycle::TransportFailure(_) | Cycle::AcquisitionFailed(_)
        )
    }
}

/// Counters reported by [`LongPoll::listen`] when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenSummary {
    pub cycles: u64,
    pub acquisitions: u64,
    pub failures: u64,
    pub events_handled: u64,
    pub handler_failures: u64,
}

// ============================================================================
// LongPoll
// ============================================================================

/// One long-poll session for one community.
///
/// Each instance owns its [`SessionState`]; run one instance per community
/// to poll several at once.
pub struct LongPoll {
    caller: Arc<dyn MethodCaller>,
    transport: Arc<dyn Transport>,
    group_id: i64,
    session: SessionState,
    timeout_margin: Duration,
    backoff: Duration,
}

impl LongPoll {
    pub const DEFAULT_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);
    pub const MIN_BACKOFF: Duration = Duration::from_secs(1);

    pub fn new(caller: Arc<dyn MethodCaller>, transport: Arc<dyn Transport>, group_id: i64) -> Self {
        Self {
            caller,
            transport,
            group_id,
            session: SessionState::default(),
            timeout_margin: Self::DEFAULT_TIMEOUT_MARGIN,
            backoff: Self::DEFAULT_BACKOFF,
        }
    }

    /// Use the client both for acquisition and, through its transport, for
    /// fetching.
    pub fn from_client(client: Arc<Client>, group_id: i64) -> Self {
        let transport = client.transport();
        Self::new(client, transport, group_id)
    }

    /// Apply wait, timeout margin and backoff from config.
    #[must_use]
    pub fn with_config(mut self, config: &LongPollConfig) -> Self {
        self.session.set_wait(Wait::new(config.wait_seconds));
        self.timeout_margin = config.timeout_margin();
        self.with_backoff(config.backoff())
    }

    #[must_use]
    pub fn with_timeout_margin(mut self, margin: Duration) -> Self {
        self.timeout_margin = margin;
        self
    }

    /// Pause after a failed cycle. Never shorter than [`Self::MIN_BACKOFF`].
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff.max(Self::MIN_BACKOFF);
        self
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    /// Switch communities. The current session is dropped.
    pub fn set_group_id(&mut self, group_id: i64) -> &mut Self {
        if group_id != self.group_id {
            self.group_id = group_id;
            self.session.clear();
        }
        self
    }

    /// Set the poll wait time, clamped to 1..=90 seconds.
    pub fn set_wait(&mut self, seconds: u32) -> &mut Self {
        self.session.set_wait(Wait::new(seconds));
        self
    }

    pub fn wait(&self) -> Wait {
        self.session.wait()
    }

    pub fn state(&self) -> PollState {
        self.session.state()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn cursor(&self) -> u64 {
        self.session.cursor()
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.session.endpoint()
    }

    pub fn session_key(&self) -> Option<&str> {
        self.session.key()
    }

    /// Request a server assignment without touching the session.
    pub async fn acquire(&self) -> Result<LongPollServer, UpstreamError> {
        server::acquire(self.caller.as_ref(), self.group_id).await
    }

    /// Acquire a server and commit it, replacing any current session.
    pub async fn connect(&mut self) -> Result<(), UpstreamError> {
        let server = self.acquire().await?;
        self.commit(server);
        Ok(())
    }

    /// Fetch once, acquiring a server first if there is none.
    ///
    /// Acquisition errors propagate; fetch failures yield an empty batch and
    /// leave the session marked for re-acquisition on the next call.
    pub async fn get_updates(&mut self) -> Result<Vec<Event>, UpstreamError> {
        if self.state() != PollState::Polling {
            self.connect().await?;
        }
        Ok(self.fetch().await.into_events())
    }

    /// Perform one transition: fetch when polling, otherwise acquire.
    pub async fn step(&mut self) -> Cycle {
        match self.state() {
            PollState::Polling => self.fetch().await,
            PollState::Uninitialized | PollState::Recovering => self.recover().await,
        }
    }

    /// Run `step` and dispatch events until `cancel` fires.
    ///
    /// Failed cycles are followed by a fixed backoff. Cancellation is
    /// honored between cycles, during a fetch and during backoff, but never
    /// in the middle of dispatching a batch.
    pub async fn listen<H>(&mut self, handler: &H, cancel: &CancellationToken) -> ListenSummary
    where
        H: EventHandler + ?Sized,
    {
        info!(group_id = self.group_id, "Long poll started");
        let mut summary = ListenSummary::default();

        while !cancel.is_cancelled() {
            let cycle = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                cycle = self.step() => cycle,
            };

            summary.cycles += 1;
            match &cycle {
                Cycle::Acquired => summary.acquisitions += 1,
                Cycle::TransportFailure(_) | Cycle::AcquisitionFailed(_) => summary.failures += 1,
                _ => {}
            }

            let backoff = cycle.needs_backoff();
            let report = dispatch(cycle.into_events(), handler).await;
            summary.events_handled += report.succeeded;
            summary.handler_failures += report.failed;

            if backoff {
                debug!(backoff = ?self.backoff, "Backing off before next cycle");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.backoff) => {}
                }
            }
        }

        info!(
            group_id = self.group_id,
            cycles = summary.cycles,
            events = summary.events_handled,
            "Long poll stopped"
        );
        summary
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    async fn recover(&mut self) -> Cycle {
        match self.acquire().await {
            Ok(server) => {
                self.commit(server);
                Cycle::Acquired
            }
            Err(e) => {
                warn!(group_id = self.group_id, error = %e, "Long poll server acquisition failed");
                Cycle::AcquisitionFailed(e)
            }
        }
    }

    fn commit(&mut self, server: LongPollServer) {
        self.session.commit(server);
        info!(
            group_id = self.group_id,
            endpoint = %self.session.endpoint().map(|u| u.as_str()).unwrap_or(""),
            ts = self.session.cursor(),
            "Long poll server acquired"
        );
    }

    async fn fetch(&mut self) -> Cycle {
        let Some(url) = self.session.poll_url() else {
            return self.recover().await;
        };
        let timeout = self.session.wait().as_duration() + self.timeout_margin;

        let body = match self.transport.get(&url, timeout).await {
            Ok(body) => body,
            Err(e) => return self.fetch_failed(e.into()),
        };

        match PollResponse::parse(body) {
            Ok(PollResponse::Updates { ts, updates }) => {
                debug!(
                    group_id = self.group_id,
                    ts,
                    count = updates.len(),
                    "Received updates"
                );
                self.session.advance(ts);
                Cycle::Events(updates)
            }
            Ok(PollResponse::Failed { code: 1, ts: Some(ts) }) => {
                debug!(group_id = self.group_id, ts, "Event history outdated, resetting cursor");
                self.session.reset_cursor(ts);
                Cycle::HistoryOutdated { ts }
            }
            Ok(PollResponse::Failed { code: 1, ts: None }) => {
                self.fetch_failed(FetchError::Malformed("`failed: 1` without `ts`".to_string()))
            }
            Ok(PollResponse::Failed { code: code @ (2 | 3), .. }) => {
                warn!(group_id = self.group_id, code, "Long poll session expired");
                // Code 2 only expires the key; the event position stays valid.
                self.session.invalidate(code == 2);
                Cycle::SessionExpired { code }
            }
            Ok(PollResponse::Failed { code, .. }) => {
                self.fetch_failed(FetchError::UnknownFailure(code))
            }
            Err(e) => self.fetch_failed(e),
        }
    }

    fn fetch_failed(&mut self, error: FetchError) -> Cycle {
        warn!(
            group_id = self.group_id,
            error = %error,
            "Long poll fetch failed, will re-acquire server"
        );
        self.session.invalidate(false);
        Cycle::TransportFailure(error)
    }
}

// ============================================================================
// Poll response
// ============================================================================

enum PollResponse {
    Updates { ts: u64, updates: Vec<Event> },
    Failed { code: i64, ts: Option<u64> },
}

impl PollResponse {
    fn parse(mut body: Value) -> Result<Self, FetchError> {
        if !body.is_object() {
            return Err(FetchError::Malformed(format!("expected a JSON object, got {body}")));
        }

        if let Some(failed) = body.get("failed") {
            let code = failed
                .as_i64()
                .ok_or_else(|| FetchError::Malformed(format!("non-integer `failed`: {failed}")))?;
            let ts = body.get("ts").and_then(parse_ts);
            return Ok(PollResponse::Failed { code, ts });
        }

        let ts = body
            .get("ts")
            .and_then(parse_ts)
            .ok_or_else(|| FetchError::Malformed("missing or invalid `ts`".to_string()))?;

        let updates = match body.get_mut("updates").map(Value::take) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.into_iter().map(Event::new).collect(),
            Some(other) => {
                return Err(FetchError::Malformed(format!(
                    "`updates` is not an array: {other}"
                )));
            }
        };

        Ok(PollResponse::Updates { ts, updates })
    }
}
