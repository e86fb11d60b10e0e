//! Event creation error types.

use thiserror::Error;

/// Rule configuration errors. Permit checks themselves never fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventCreationError {
    /// The creation rate is NaN.
    #[error("max_creation_rate must be a number, got {0}")]
    InvalidCreationRate(f64),

    /// A backpressure threshold of zero would block creation forever.
    #[error("event_intake_throttle must be greater than zero")]
    ZeroIntakeThrottle,
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, EventCreationError>;
