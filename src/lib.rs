//! ledger-crawl: a resumable, block-aware product page crawler
//!
//! This crate fetches a fixed list of pages through a browser backend,
//! stores each clean page on disk, and records every success in an
//! append-only ledger so an interrupted run picks up where it stopped.
//! When the target starts refusing requests the whole session halts.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for ledger-crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read URL list {path}: {source}")]
    UrlList {
        path: String,
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid marker tag: {0}")]
    InvalidTag(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Why a single fetch attempt failed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Access blocked at {url}: {reason}")]
    Blocked {
        url: String,
        reason: crawler::BlockReason,
    },

    #[error("Navigation to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Failed to write page: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to record completion: {0}")]
    Ledger(#[from] storage::StorageError),

    #[error("Invalid fetch phase transition: {from} -> {to}")]
    InvalidTransition {
        from: state::FetchPhase,
        to: state::FetchPhase,
    },

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl FetchError {
    /// Classifies the error for retry and abort decisions
    pub fn kind(&self) -> state::FailureKind {
        use state::FailureKind;

        match self {
            Self::Blocked { .. } => FailureKind::Blocked,
            Self::Timeout { .. }
            | Self::Navigation { .. }
            | Self::Browser(_)
            | Self::Io(_)
            | Self::Ledger(_) => FailureKind::Transient,
            Self::InvalidTransition { .. } | Self::Unexpected(_) => FailureKind::Permanent,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Result type alias for ledger-crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for a single fetch attempt
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Coordinator};
pub use output::CrawlSummary;
pub use state::{FailureKind, FetchOutcome, FetchPhase};
pub use url::filename_for;
