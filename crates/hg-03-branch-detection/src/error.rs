//! Error types for branch detection.
//!
//! Branching itself is never an error; it is returned as data.

use thiserror::Error;

/// Branch detection errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BranchError {
    /// An event was checked or reported before any event window was set.
    #[error("event window not set: call update_event_window() first")]
    EventWindowNotSet,
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, BranchError>;
