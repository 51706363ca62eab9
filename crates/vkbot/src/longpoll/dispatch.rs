//! Per-event handler dispatch with failure isolation.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::error;
use vkbot_types::Event;

/// Consumer logic invoked once per received event.
///
/// Closures of the form `|event| async move { ... }` implement this trait.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Event) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, event: Event) -> anyhow::Result<()> {
        (self)(event).await
    }
}

/// Outcome of dispatching one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub succeeded: u64,
    pub failed: u64,
}

/// Offer each event to `handler` in order, one at a time.
///
/// A handler error or panic is logged and counted; the remaining events are
/// still dispatched.
pub async fn dispatch<H>(events: Vec<Event>, handler: &H) -> DispatchReport
where
    H: EventHandler + ?Sized,
{
    let mut report = DispatchReport::default();

    for (index, event) in events.into_iter().enumerate() {
        let event_type = event.kind().map(str::to_owned);
        let event_id = event.event_id().map(str::to_owned);

        match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
            Ok(Ok(())) => report.succeeded += 1,
            Ok(Err(e)) => {
                report.failed += 1;
                error!(
                    index,
                    event_type = event_type.as_deref().unwrap_or("unknown"),
                    event_id = event_id.as_deref().unwrap_or(""),
                    error = %e,
                    "Error processing event"
                );
            }
            Err(panic) => {
                report.failed += 1;
                error!(
                    index,
                    event_type = event_type.as_deref().unwrap_or("unknown"),
                    event_id = event_id.as_deref().unwrap_or(""),
                    panic = panic_message(&*panic),
                    "Event handler panicked"
                );
            }
        }
    }

    report
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
