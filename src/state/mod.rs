//! State module for tracking fetch progress
//!
//! # Components
//!
//! - `FetchPhase`: Tracks where a single fetch attempt is (tab opened, navigated, persisted, etc.)
//! - `FetchOutcome`: The terminal result of a URL after retries
//! - `FailureKind`: How the orchestrator treats a failure

mod fetch_phase;
mod outcome;

// Re-export main types
pub use fetch_phase::FetchPhase;
pub use outcome::{FailureKind, FetchOutcome};
