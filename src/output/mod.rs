//! Output module for run summaries and progress reports
//!
//! This module handles:
//! - The end-of-run summary and the exit status derived from it
//! - The ledger progress report for `--status`

pub mod stats;

pub use stats::{
    load_progress, print_progress, print_summary, CrawlSummary, LedgerProgress, EXIT_BLOCKED,
    EXIT_COMPLETED,
};
