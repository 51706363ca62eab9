//! Long-poll session state.
//!
//! The endpoint and key live together in [`Assignment`] and are only ever
//! present while the session is [`PollState::Polling`], so they are always
//! both set or both unset.

use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::limits;

use super::server::LongPollServer;

/// Poll request wait time, clamped to the platform's 1..=90 second range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Wait(u32);

impl Wait {
    pub fn new(seconds: u32) -> Self {
        Self(seconds.clamp(limits::LONG_POLL_WAIT_MIN, limits::LONG_POLL_WAIT_MAX))
    }

    pub fn seconds(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for Wait {
    fn default() -> Self {
        Self(limits::LONG_POLL_WAIT_DEFAULT)
    }
}

/// Where the poll loop currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No server has been acquired yet.
    Uninitialized,
    /// Holding a valid endpoint and key.
    Polling,
    /// The previous endpoint and key were dropped; acquisition is pending.
    Recovering,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Assignment {
    endpoint: Url,
    key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Polling(Assignment),
    /// `keep_cursor` is set when only the key expired, so the next
    /// acquisition renews the key without moving the cursor.
    Recovering { keep_cursor: bool },
}

/// Endpoint, key, cursor and wait time of one polling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    phase: Phase,
    cursor: u64,
    wait: Wait,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Wait::default())
    }
}

impl SessionState {
    pub fn new(wait: Wait) -> Self {
        Self {
            phase: Phase::Uninitialized,
            cursor: 0,
            wait,
        }
    }

    pub fn state(&self) -> PollState {
        match self.phase {
            Phase::Uninitialized => PollState::Uninitialized,
            Phase::Polling(_) => PollState::Polling,
            Phase::Recovering { .. } => PollState::Recovering,
        }
    }

    pub fn endpoint(&self) -> Option<&Url> {
        match &self.phase {
            Phase::Polling(a) => Some(&a.endpoint),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match &self.phase {
            Phase::Polling(a) => Some(a.key.as_str()),
            _ => None,
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn wait(&self) -> Wait {
        self.wait
    }

    pub(super) fn set_wait(&mut self, wait: Wait) {
        self.wait = wait;
    }

    /// `{endpoint}?act=a_check&key=..&ts=..&wait=..`, or `None` without a session.
    pub(super) fn poll_url(&self) -> Option<Url> {
        let Phase::Polling(assignment) = &self.phase else {
            return None;
        };
        let mut url = assignment.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("act", "a_check")
            .append_pair("key", &assignment.key)
            .append_pair("ts", &self.cursor.to_string())
            .append_pair("wait", &self.wait.seconds().to_string());
        Some(url)
    }

    /// Install a freshly acquired server.
    pub(super) fn commit(&mut self, server: LongPollServer) {
        let keep_cursor = matches!(self.phase, Phase::Recovering { keep_cursor: true });
        if !keep_cursor {
            self.cursor = server.ts;
        }
        self.phase = Phase::Polling(Assignment {
            endpoint: server.endpoint,
            key: server.key,
        });
    }

    /// Move the cursor forward after a successful fetch. A value behind the
    /// current cursor is ignored.
    pub(super) fn advance(&mut self, ts: u64) {
        if ts < self.cursor {
            warn!(
                current = self.cursor,
                received = ts,
                "Poll server returned an older cursor, keeping current"
            );
            return;
        }
        self.cursor = ts;
    }

    /// Server-directed cursor correction; may move backward.
    pub(super) fn reset_cursor(&mut self, ts: u64) {
        self.cursor = ts;
    }

    /// Drop the endpoint and key. The cursor is left as it is.
    pub(super) fn invalidate(&mut self, keep_cursor: bool) {
        self.phase = Phase::Recovering { keep_cursor };
    }

    /// Forget the session entirely, e.g. after switching groups.
    pub(super) fn clear(&mut self) {
        self.phase = Phase::Uninitialized;
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(ts: u64) -> LongPollServer {
        LongPollServer {
            endpoint: Url::parse("https://lp.vk.com/wh1").unwrap(),
            key: "k1".to_string(),
            ts,
        }
    }

    fn assert_paired(session: &SessionState) {
        assert_eq!(session.endpoint().is_some(), session.key().is_some());
    }

    #[test]
    fn wait_is_clamped() {
        assert_eq!(Wait::new(150).seconds(), 90);
        assert_eq!(Wait::new(0).seconds(), 1);
        assert_eq!(Wait::new(25).seconds(), 25);
        assert_eq!(Wait::default().as_duration(), Duration::from_secs(25));
    }

    #[test]
    fn starts_empty() {
        let session = SessionState::default();
        assert_eq!(session.state(), PollState::Uninitialized);
        assert_eq!(session.cursor(), 0);
        assert!(session.poll_url().is_none());
        assert_paired(&session);
    }

    #[test]
    fn commit_installs_server() {
        let mut session = SessionState::default();
        session.commit(server(10));

        assert_eq!(session.state(), PollState::Polling);
        assert_eq!(session.cursor(), 10);
        assert_eq!(session.key(), Some("k1"));
        assert_paired(&session);

        let url = session.poll_url().unwrap();
        assert_eq!(url.query(), Some("act=a_check&key=k1&ts=10&wait=25"));
    }

    #[test]
    fn advance_never_moves_backward() {
        let mut session = SessionState::default();
        session.commit(server(10));

        session.advance(12);
        assert_eq!(session.cursor(), 12);
        session.advance(11);
        assert_eq!(session.cursor(), 12);

        session.reset_cursor(3);
        assert_eq!(session.cursor(), 3);
    }

    #[test]
    fn key_expiry_keeps_cursor_across_reacquisition() {
        let mut session = SessionState::default();
        session.commit(server(10));
        session.advance(20);

        session.invalidate(true);
        assert_eq!(session.state(), PollState::Recovering);
        assert_eq!(session.cursor(), 20);
        assert_paired(&session);

        session.commit(server(99));
        assert_eq!(session.cursor(), 20);
    }

    #[test]
    fn full_invalidation_adopts_new_cursor() {
        let mut session = SessionState::default();
        session.commit(server(10));
        session.invalidate(false);
        session.commit(server(99));
        assert_eq!(session.cursor(), 99);
    }

    #[test]
    fn clear_resets_everything() {
        let mut session = SessionState::default();
        session.commit(server(10));
        session.clear();
        assert_eq!(session.state(), PollState::Uninitialized);
        assert_eq!(session.cursor(), 0);
        assert_paired(&session);
    }
}
