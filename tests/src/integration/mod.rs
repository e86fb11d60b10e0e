//! Integration flows across subsystem crates.

pub mod branching;
pub mod event_creation;
pub mod event_stream;
