//! Fixed-delay retry envelope
//!
//! | Setting | Default |
//! |---------|---------|
//! | Attempts per URL | 3 (including the first) |
//! | Delay between attempts | 2s, constant |
//! | Retried errors | all, blocked pages included |
//!
//! A blocked page consumes an attempt like any other failure. Whether the
//! final error ends the session is decided by the orchestrator, not here.

use crate::config::CrawlerConfig;
use crate::FetchError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether a failed attempt may be retried
pub type RetryPredicate = Arc<dyn Fn(&FetchError) -> bool + Send + Sync>;

/// Bounded retry with a constant delay
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    retryable: RetryPredicate,
}

impl RetryPolicy {
    /// Retries every error up to `max_attempts` total attempts
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            retryable: Arc::new(|_| true),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }

    /// Replaces the retryable-error predicate
    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&FetchError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `op` until it succeeds, the error is not retryable, or attempts run out
    ///
    /// `op` receives the 1-based attempt number. The error of the last
    /// attempt is returned unchanged.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt >= self.max_attempts {
                        tracing::error!(
                            "{}: giving up after {} attempt(s): {}",
                            label,
                            attempt,
                            e
                        );
                        return Err(e);
                    }
                    if !(self.retryable)(&e) {
                        tracing::error!("{}: not retrying: {}", label, e);
                        return Err(e);
                    }

                    tracing::warn!(
                        "{}: attempt {}/{} failed, retrying in {:?}: {}",
                        label,
                        attempt,
                        self.max_attempts,
                        self.delay,
                        e
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
