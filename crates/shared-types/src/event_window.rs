//! # Event Window
//!
//! The boundary between ancient and non-ancient events, published by the
//! consensus algorithm each time it advances.
//!
//! An event is ancient when its ancient indicator (generation or birth round,
//! depending on `AncientMode`) is strictly below `ancient_threshold`. Ancient
//! events are safely ignorable: they can no longer influence consensus.

use crate::entities::EventDescriptor;
use serde::{Deserialize, Serialize};

/// Which event field is compared against the ancient threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AncientMode {
    /// Compare `EventDescriptor::generation`.
    GenerationThreshold,
    /// Compare `EventDescriptor::birth_round`.
    #[default]
    BirthRoundThreshold,
}

/// Snapshot of the consensus event window.
///
/// Windows are expected to only move forward. The components that consume them
/// do not verify this; it is part of the consensus contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    /// The latest round to have reached consensus.
    pub latest_consensus_round: u64,
    /// Events whose ancient indicator is below this value are ancient.
    pub ancient_threshold: u64,
    /// Which ancient indicator the threshold applies to.
    pub ancient_mode: AncientMode,
}

impl EventWindow {
    pub fn new(
        latest_consensus_round: u64,
        ancient_threshold: u64,
        ancient_mode: AncientMode,
    ) -> Self {
        Self {
            latest_consensus_round,
            ancient_threshold,
            ancient_mode,
        }
    }

    /// The window at genesis: nothing is ancient.
    pub fn genesis(ancient_mode: AncientMode) -> Self {
        Self::new(0, 0, ancient_mode)
    }

    /// The value of `descriptor` compared against the threshold in this mode.
    pub fn ancient_indicator(&self, descriptor: &EventDescriptor) -> u64 {
        match self.ancient_mode {
            AncientMode::GenerationThreshold => descriptor.generation,
            AncientMode::BirthRoundThreshold => descriptor.birth_round,
        }
    }

    /// Returns true if the described event is ancient with respect to this window.
    pub fn is_ancient(&self, descriptor: &EventDescriptor) -> bool {
        self.ancient_indicator(descriptor) < self.ancient_threshold
    }
}
