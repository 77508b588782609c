//! Fetch phase definitions for a single URL attempt
//!
//! Every attempt walks `Idle → TabOpened → Navigated → Waited → Classified`
//! and ends in `Persisted` or `Failed`.

use std::fmt;

/// Where a single fetch attempt currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchPhase {
    // ===== Active Phases =====
    /// Nothing acquired yet
    Idle,

    /// A browser tab is open for this attempt
    TabOpened,

    /// The document finished loading
    Navigated,

    /// The settle wait elapsed
    Waited,

    /// The block detector judged the page clean
    Classified,

    // ===== Terminal Phases =====
    /// The page is on disk and in the ledger
    Persisted,

    /// The attempt ended with an error
    Failed,
}

impl FetchPhase {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Persisted | Self::Failed)
    }

    /// Returns true if the attempt is still in progress
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// The phase that follows this one on the success path
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::TabOpened),
            Self::TabOpened => Some(Self::Navigated),
            Self::Navigated => Some(Self::Waited),
            Self::Waited => Some(Self::Classified),
            Self::Classified => Some(Self::Persisted),
            Self::Persisted | Self::Failed => None,
        }
    }

    /// Whether moving from `self` to `to` is allowed
    ///
    /// Phases advance one step at a time; any active phase may fail.
    pub fn can_transition_to(&self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::TabOpened => "tab_opened",
            Self::Navigated => "navigated",
            Self::Waited => "waited",
            Self::Classified => "classified",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        }
    }

    /// Returns all phases in pipeline order
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::TabOpened,
            Self::Navigated,
            Self::Waited,
            Self::Classified,
            Self::Persisted,
            Self::Failed,
        ]
    }
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
