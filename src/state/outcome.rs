//! Terminal result of fetching one URL

use crate::storage::StoredPage;
use crate::FetchError;
use std::fmt;

/// How a failure is treated by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The site refused us; ends the whole session
    Blocked,
    /// Timeouts, navigation and write failures
    Transient,
    /// Anything unclassified
    Permanent,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Blocked => "blocked",
            Self::Transient => "transient",
            Self::Permanent => "permanent",
        };
        write!(f, "{}", name)
    }
}

/// Final outcome of a URL once the retry envelope is exhausted
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page was stored and recorded in the ledger
    Success(StoredPage),
    /// The last attempt was classified as blocked
    Blocked(FetchError),
    /// The last attempt failed for a retryable reason
    Transient(FetchError),
    /// The last attempt failed unexpectedly
    Permanent(FetchError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    /// The error behind a failed outcome
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Success(_) => None,
            Self::Blocked(e) | Self::Transient(e) | Self::Permanent(e) => Some(e),
        }
    }
}

impl From<Result<StoredPage, FetchError>> for FetchOutcome {
    fn from(result: Result<StoredPage, FetchError>) -> Self {
        match result {
            Ok(page) => Self::Success(page),
            Err(e) => match e.kind() {
                FailureKind::Blocked => Self::Blocked(e),
                FailureKind::Transient => Self::Transient(e),
                FailureKind::Permanent => Self::Permanent(e),
            },
        }
    }
}
