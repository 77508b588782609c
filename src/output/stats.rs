//! Run statistics
//!
//! This module provides the end-of-run summary produced by the orchestrator
//! and the ledger progress report shown by `--status`.

use crate::storage::{CompletedStore, StorageResult};
use crate::url::count_completed;
use chrono::{DateTime, Local};
use std::time::Duration;

/// Exit status for a run that finished without detecting a block
pub const EXIT_COMPLETED: u8 = 0;

/// Exit status for a run halted by a detected block
pub const EXIT_BLOCKED: u8 = 2;

/// Outcome counts for a single crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// When the run started
    pub started_at: DateTime<Local>,

    /// URLs in the list after deduplication
    pub total_urls: usize,

    /// URLs skipped because the ledger already had them
    pub skipped: usize,

    /// URLs handed to the worker pool
    pub pending: usize,

    /// Pages stored and recorded
    pub success_count: usize,

    /// URLs whose final attempt failed, the blocked URL included
    pub fail_count: usize,

    /// Whether a block was detected
    pub blocked: bool,

    /// The URL that triggered the abort
    pub blocked_url: Option<String>,

    /// Whether the run was stopped from outside (Ctrl-C)
    pub interrupted: bool,

    /// Pending URLs never started
    pub cancelled: usize,

    /// In-flight URLs that completed after the abort
    pub finished_after_abort: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn new(started_at: DateTime<Local>, total_urls: usize, skipped: usize) -> Self {
        Self {
            started_at,
            total_urls,
            skipped,
            pending: total_urls.saturating_sub(skipped),
            success_count: 0,
            fail_count: 0,
            blocked: false,
            blocked_url: None,
            interrupted: false,
            cancelled: 0,
            finished_after_abort: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Process exit status for this run
    pub fn exit_code(&self) -> u8 {
        if self.blocked {
            EXIT_BLOCKED
        } else {
            EXIT_COMPLETED
        }
    }

    /// When the run started and how much work it had
    pub fn timing_line(&self) -> String {
        format!(
            "Started {} ({} URL(s) in list, {} pending)",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.total_urls,
            self.pending
        )
    }

    /// The one-line summary printed at exit
    pub fn summary_line(&self) -> String {
        format!(
            "Crawl summary: {} succeeded, {} failed, {} skipped (already completed), elapsed {:.2}s",
            self.success_count,
            self.fail_count,
            self.skipped,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("{}", summary.timing_line());
    println!("{}", summary.summary_line());

    if summary.blocked {
        println!();
        println!(
            "Block detected{}. The crawl was halted.",
            summary
                .blocked_url
                .as_deref()
                .map(|url| format!(" at {}", url))
                .unwrap_or_default()
        );
        println!(
            "  {} pending URL(s) not started, {} finished after the abort",
            summary.cancelled, summary.finished_after_abort
        );
        println!("  Change your network egress (IP/proxy) and rerun; completed URLs are skipped.");
    } else if summary.interrupted {
        println!();
        println!(
            "Interrupted. {} pending URL(s) not started; rerun to resume.",
            summary.cancelled
        );
    }
}

/// How far the ledger has progressed through the URL list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerProgress {
    /// URLs in the list
    pub total: usize,

    /// URLs in the list already recorded in the ledger
    pub completed: usize,

    /// URLs still to fetch
    pub pending: usize,

    /// Ledger entries that are not in the list
    pub untracked: usize,
}

/// Compares the ledger against the URL list
///
/// # Arguments
///
/// * `universe` - The deduplicated URL list
/// * `ledger` - The completed store to read
pub async fn load_progress(
    universe: &[String],
    ledger: &dyn CompletedStore,
) -> StorageResult<LedgerProgress> {
    let recorded = ledger.load().await?;

    let completed = count_completed(universe, &recorded);
    let untracked = recorded.len().saturating_sub(completed);

    Ok(LedgerProgress {
        total: universe.len(),
        completed,
        pending: universe.len() - completed,
        untracked,
    })
}

/// Prints ledger progress to stdout in a formatted manner
pub fn print_progress(progress: &LedgerProgress) {
    println!("=== Crawl Progress ===\n");

    let percentage = if progress.total > 0 {
        (progress.completed as f64 / progress.total as f64) * 100.0
    } else {
        0.0
    };

    println!("  URLs in list: {}", progress.total);
    println!("  Completed: {} ({:.1}%)", progress.completed, percentage);
    println!("  Pending: {}", progress.pending);

    if progress.untracked > 0 {
        println!("  Ledger entries not in list: {}", progress.untracked);
    }
}
