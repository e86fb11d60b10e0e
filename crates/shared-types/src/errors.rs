//! # Error Types
//!
//! Errors raised while building shared domain values.

use crate::entities::NodeId;
use thiserror::Error;

/// Errors that can occur while constructing a `Roster`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// A roster must contain at least one node.
    #[error("Roster is empty")]
    Empty,

    /// The same node id was listed twice.
    #[error("Duplicate node in roster: {0}")]
    DuplicateNode(NodeId),

    /// The sum of all weights does not fit in a u64.
    #[error("Total roster weight overflows u64")]
    WeightOverflow,
}
