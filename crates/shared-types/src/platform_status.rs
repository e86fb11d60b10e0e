//! # Platform Status
//!
//! The node's lifecycle status, pushed by an external status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlatformStatus {
    /// Loading state and starting components.
    #[default]
    StartingUp,
    /// Fully participating in consensus.
    Active,
    /// Replaying events from the preconsensus event stream.
    ReplayingEvents,
    /// Gossiping and observing, but not yet creating events.
    Observing,
    /// A freeze round has been reached; only the final signature event may be created.
    Freezing,
    /// The freeze state has been signed and saved.
    FreezeComplete,
    /// Fallen behind the network; a reconnect is required.
    Behind,
    /// A reconnect has completed and the node is catching up.
    ReconnectComplete,
    /// Self-event checks are in progress after becoming active.
    Checking,
    /// An unrecoverable failure occurred.
    CatastrophicFailure,
}

impl PlatformStatus {
    /// Statuses in which ordinary event creation is allowed.
    pub fn permits_event_creation(&self) -> bool {
        matches!(self, Self::Active | Self::Checking)
    }
}

impl fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartingUp => "STARTING_UP",
            Self::Active => "ACTIVE",
            Self::ReplayingEvents => "REPLAYING_EVENTS",
            Self::Observing => "OBSERVING",
            Self::Freezing => "FREEZING",
            Self::FreezeComplete => "FREEZE_COMPLETE",
            Self::Behind => "BEHIND",
            Self::ReconnectComplete => "RECONNECT_COMPLETE",
            Self::Checking => "CHECKING",
            Self::CatastrophicFailure => "CATASTROPHIC_FAILURE",
        };
        f.write_str(name)
    }
}
