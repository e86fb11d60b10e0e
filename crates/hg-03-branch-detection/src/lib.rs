//! # Branch Detection
//!
//! **Crate ID:** hg-03
//!
//! ## Purpose
//!
//! A node branches (equivocates) when it creates two events that claim the same
//! self parent. Under BFT this is an expected fault, not a bug: it is detected,
//! accounted for by stake, and reported. It never halts the node.
//!
//! ## Components
//!
//! | Type | Role |
//! |------|------|
//! | `BranchDetector` | Tracks each creator's most recent event; flags events whose self parent is not it |
//! | `BranchReporter` | Tracks flagged creators and their stake; logs and publishes metrics; escalates past one third of stake |
//!
//! ## Per-Creator State (detector)
//!
//! ```text
//! Absent ──event──→ HasRecent(d) ──event e, e.self_parent != d──→ flagged, HasRecent(e)
//!                        │
//!                        └── d ancient on window advance ──→ Absent
//! ```
//!
//! ## Usage Contract
//!
//! - `update_event_window()` must be called before the first check/report;
//!   otherwise both return `BranchError::EventWindowNotSet`.
//! - Events must be fed per creator in self-parent order.
//! - Neither type is synchronized. Drive each from a single thread.
//! - State is a dense array indexed by roster slot. Creators outside the
//!   roster are ignored (with a rate-limited warning).

pub mod config;
pub mod detector;
pub mod error;
pub mod reporter;

pub use config::BranchReporterConfig;
pub use detector::BranchDetector;
pub use error::{BranchError, Result};
pub use reporter::{
    BranchReporter, METRIC_BRANCHING_EVENTS, METRIC_BRANCHING_NODE_COUNT,
    METRIC_BRANCHING_WEIGHT_FRACTION,
};
