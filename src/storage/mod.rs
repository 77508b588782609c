//! Storage module for persisting crawl results
//!
//! This module handles everything the crawler writes to disk:
//! - The append-only ledger of completed URLs, used to resume runs
//! - The output directory of fetched HTML pages

mod ledger;
mod pages;
mod traits;

pub use ledger::FileLedger;
pub use pages::{PageStore, StoredPage};
pub use traits::{CompletedStore, StorageError, StorageResult};

use std::path::Path;

/// Opens the ledger at the given path
///
/// Nothing is touched on disk until the first append.
pub fn open_ledger(path: &Path) -> FileLedger {
    FileLedger::new(path)
}
