//! Crawler module for page fetching and orchestration
//!
//! This module contains the core crawling logic, including:
//! - Block page detection
//! - The fixed-delay retry envelope
//! - The per-URL fetch pipeline
//! - Overall crawl coordination and interrupt handling

mod coordinator;
mod detector;
mod fetcher;
mod interrupt;
mod retry;

pub use coordinator::Coordinator;
pub use detector::{BlockDetector, BlockReason, Verdict};
pub use fetcher::{FetchTiming, PageFetcher};
pub use interrupt::{watch_interrupts, InterruptOutcome};
pub use retry::{RetryPolicy, RetryPredicate};

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::output::CrawlSummary;
use crate::CrawlError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the URL list named in the configuration
/// 2. Skip every URL already recorded in the ledger
/// 3. Fetch the rest through the given session until done, blocked or cancelled
/// 4. Shut the session down and return the run summary
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `session` - A launched browser session
/// * `cancel` - Stops the pool from starting new URLs when cancelled
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - The run finished, possibly halted by a block
/// * `Err(CrawlError)` - The URL list or ledger could not be read
pub async fn crawl(
    config: &Config,
    session: Arc<dyn BrowserSession>,
    cancel: CancellationToken,
) -> Result<CrawlSummary, CrawlError> {
    let universe = match crate::url::load_url_list(&config.input.url_list) {
        Ok(universe) => universe,
        Err(e) => {
            if let Err(shutdown) = session.shutdown().await {
                tracing::warn!("Failed to shut down browser session: {}", shutdown);
            }
            return Err(e);
        }
    };
    tracing::info!(
        "Loaded {} URL(s) from {}",
        universe.len(),
        config.input.url_list.display()
    );

    Coordinator::new(config, session)
        .with_cancellation(cancel)
        .run(&universe)
        .await
}
