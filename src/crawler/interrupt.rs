//! Interrupt handling
//!
//! The first interrupt cancels the run cooperatively: no new URL starts and
//! in-flight pages finish. A second interrupt asks the caller to exit at once.

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// How the interrupt watcher ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// A second interrupt arrived; the process should exit immediately
    Forced,
    /// The signal source failed before a second interrupt
    Closed,
}

/// Waits for interrupts from `next_signal`
///
/// `next_signal` is called once per expected interrupt, e.g.
/// `tokio::signal::ctrl_c`.
pub async fn watch_interrupts<F, Fut>(
    mut next_signal: F,
    cancel: CancellationToken,
) -> InterruptOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        tracing::warn!("Cannot listen for interrupts: {}", e);
        return InterruptOutcome::Closed;
    }
    tracing::warn!("Interrupt received, finishing in-flight pages (interrupt again to quit)");
    cancel.cancel();

    match next_signal().await {
        Ok(()) => {
            tracing::error!("Second interrupt received, exiting now");
            InterruptOutcome::Forced
        }
        Err(e) => {
            tracing::warn!("Stopped listening for interrupts: {}", e);
            InterruptOutcome::Closed
        }
    }
}
