//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the run loop that ties the pieces together:
//! - Loading the ledger and computing the pending URLs
//! - Running a fixed-size pool of workers over a shared queue
//! - Consuming completions in arrival order and counting outcomes
//! - Halting the whole session when a block is detected
//! - Releasing the shared browser session on every exit path

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::output::CrawlSummary;
use crate::state::FetchOutcome;
use crate::storage::{open_ledger, CompletedStore};
use crate::url::{count_completed, pending_urls};
use crate::{CrawlError, FetchError};
use chrono::Local;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A finished URL reported by a worker
#[derive(Debug)]
struct Completion {
    url: String,
    outcome: FetchOutcome,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    session: Arc<dyn BrowserSession>,
    ledger: Arc<dyn CompletedStore>,
    fetcher: Arc<PageFetcher>,
    max_workers: usize,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator over an already launched session
    ///
    /// # Arguments
    ///
    /// * `config` - The run configuration
    /// * `session` - The shared browser session, shut down when the run ends
    pub fn new(config: &Config, session: Arc<dyn BrowserSession>) -> Self {
        let ledger: Arc<dyn CompletedStore> =
            Arc::new(open_ledger(&config.output.completed_ledger));
        let fetcher = PageFetcher::from_config(config, Arc::clone(&session), Arc::clone(&ledger));

        let max_workers = config.crawler.max_workers as usize;

        Self::with_fetcher(session, ledger, fetcher, max_workers)
    }

    /// Creates a coordinator from pre-built parts
    pub fn with_fetcher(
        session: Arc<dyn BrowserSession>,
        ledger: Arc<dyn CompletedStore>,
        fetcher: PageFetcher,
        max_workers: usize,
    ) -> Self {
        Self {
            session,
            ledger,
            fetcher: Arc::new(fetcher),
            max_workers: max_workers.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the cancellation token, e.g. with one wired to Ctrl-C
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the pool from taking new URLs when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl over `universe` and shuts the session down
    ///
    /// Individual URL failures never fail the run; only an unreadable
    /// ledger does. The session is shut down in both cases.
    pub async fn run(&self, universe: &[String]) -> Result<CrawlSummary, CrawlError> {
        tracing::info!(
            "Starting crawl of {} URL(s) with the {} backend",
            universe.len(),
            self.session.name()
        );

        let result = self.run_pool(universe).await;

        if let Err(e) = self.session.shutdown().await {
            tracing::warn!("Failed to shut down browser session: {}", e);
        }

        result
    }

    async fn run_pool(&self, universe: &[String]) -> Result<CrawlSummary, CrawlError> {
        let started_at = Local::now();
        let start_time = Instant::now();

        let completed = self.ledger.load().await?;
        let pending = pending_urls(universe, &completed);
        let skipped = count_completed(universe, &completed);
        let mut summary = CrawlSummary::new(started_at, skipped + pending.len(), skipped);

        tracing::info!(
            "{} already completed, {} pending",
            summary.skipped,
            summary.pending
        );

        if pending.is_empty() {
            tracing::info!("Nothing left to fetch");
            summary.elapsed = start_time.elapsed();
            return Ok(summary);
        }

        let workers = self.max_workers.min(pending.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(pending)));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut tasks = JoinSet::new();
        for id in 0..workers {
            let worker = Worker {
                id,
                fetcher: Arc::clone(&self.fetcher),
                queue: Arc::clone(&queue),
                cancel: self.cancel.clone(),
                tx: tx.clone(),
            };
            tasks.spawn(worker.run());
        }
        drop(tx);
        tracing::debug!("Spawned {} worker(s)", workers);

        while let Some(Completion { url, outcome }) = rx.recv().await {
            match outcome {
                FetchOutcome::Success(_) => {
                    summary.success_count += 1;
                }
                FetchOutcome::Blocked(e) => {
                    tracing::error!("Block detected, halting crawl: {}", e);
                    summary.fail_count += 1;
                    summary.blocked = true;
                    summary.blocked_url = Some(url);
                    self.cancel.cancel();
                    break;
                }
                FetchOutcome::Transient(e) | FetchOutcome::Permanent(e) => {
                    tracing::error!("Giving up on {}: {}", url, e);
                    summary.fail_count += 1;
                }
            }
        }

        // Workers stop taking URLs once cancelled; whatever they had in
        // flight still finishes and is reported here.
        if summary.blocked {
            while let Some(Completion { url, outcome }) = rx.recv().await {
                tracing::info!(
                    "{} finished after abort ({})",
                    url,
                    if outcome.is_success() { "saved" } else { "failed" }
                );
                summary.finished_after_abort += 1;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        summary.cancelled = queue.lock().await.len();
        summary.interrupted = !summary.blocked && self.cancel.is_cancelled();
        summary.elapsed = start_time.elapsed();

        if summary.cancelled > 0 {
            tracing::info!("{} pending URL(s) were not started", summary.cancelled);
        }
        tracing::info!(
            "Crawl finished: {} succeeded, {} failed in {:.2}s",
            summary.success_count,
            summary.fail_count,
            summary.elapsed.as_secs_f64()
        );

        Ok(summary)
    }
}

/// One member of the worker pool
struct Worker {
    id: usize,
    fetcher: Arc<PageFetcher>,
    queue: Arc<Mutex<VecDeque<String>>>,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<Completion>,
}

impl Worker {
    async fn run(self) {
        let mut handled = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let url = match self.queue.lock().await.pop_front() {
                Some(url) => url,
                None => break,
            };

            let outcome = self.fetch_isolated(&url).await;

            // Stop the pool before reporting so no worker starts another URL
            if outcome.is_blocked() {
                self.cancel.cancel();
            }

            handled += 1;
            if self.tx.send(Completion { url, outcome }).is_err() {
                break;
            }
        }

        tracing::debug!("Worker {} exiting after {} URL(s)", self.id, handled);
    }

    /// Runs the fetch on its own task so a panic is contained to one URL
    async fn fetch_isolated(&self, url: &str) -> FetchOutcome {
        let fetcher = Arc::clone(&self.fetcher);
        let task_url = url.to_string();

        match tokio::spawn(async move { fetcher.fetch(&task_url).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Fetch task for {} failed: {}", url, e);
                FetchOutcome::Permanent(FetchError::Unexpected(e.to_string()))
            }
        }
    }
}
