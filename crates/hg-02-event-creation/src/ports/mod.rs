//! Ports for the event creation rules.

pub mod outbound;

pub use outbound::*;
