//! Event creation status values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the event creator is doing, or why it is not creating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCreationStatus {
    /// Not doing anything in particular.
    #[default]
    Idle,
    /// Rules permit creation; an event is being built.
    AttemptingCreation,
    /// Permitted, but no parents were eligible.
    NoEligibleParents,
    /// Blocked by the creation rate limit.
    RateLimited,
    /// Blocked by the current platform status.
    PlatformStatus,
    /// Blocked by backpressure or poor health.
    Overloaded,
    /// A new event is waiting to enter the intake pipeline.
    PipelineInsertion,
}

impl fmt::Display for EventCreationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::AttemptingCreation => "ATTEMPTING_CREATION",
            Self::NoEligibleParents => "NO_ELIGIBLE_PARENTS",
            Self::RateLimited => "RATE_LIMITED",
            Self::PlatformStatus => "PLATFORM_STATUS",
            Self::Overloaded => "OVERLOADED",
            Self::PipelineInsertion => "PIPELINE_INSERTION",
        };
        f.write_str(name)
    }
}

/// Single-call result of a permit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationDecision {
    Permitted,
    Blocked(EventCreationStatus),
}

impl CreationDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted)
    }
}
