//! Storage traits and error types
//!
//! This module defines the trait interface for the completed-URL ledger and
//! associated error types.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Ledger entries must be a single line, got {0:?}")]
    InvalidEntry(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of URLs whose pages were persisted
///
/// The ledger only grows: there is no removal or update. Implementations
/// must keep concurrent appends from interleaving partial lines.
#[async_trait]
pub trait CompletedStore: Send + Sync {
    /// Reads every URL appended so far, deduplicated
    ///
    /// A ledger that was never written is an empty set, not an error.
    async fn load(&self) -> StorageResult<HashSet<String>>;

    /// Records one URL; returns only after the entry is flushed
    async fn append(&self, url: &str) -> StorageResult<()>;
}
