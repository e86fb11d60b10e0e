//! Stops creation while the node has been unhealthy for too long.

use crate::domain::rule::EventCreationRule;
use crate::domain::status::EventCreationStatus;
use crate::ports::UnhealthyDurationSource;
use std::sync::Arc;
use std::time::Duration;

/// Permits creation while the unhealthy duration is at most `maximum`.
pub struct PlatformHealthRule {
    health: Arc<dyn UnhealthyDurationSource>,
    maximum: Duration,
}

impl PlatformHealthRule {
    pub fn new(health: Arc<dyn UnhealthyDurationSource>, maximum: Duration) -> Self {
        Self { health, maximum }
    }
}

impl EventCreationRule for PlatformHealthRule {
    fn is_event_creation_permitted(&mut self) -> bool {
        self.health.unhealthy_duration() <= self.maximum
    }

    fn event_was_created(&mut self) {}

    fn event_creation_status(&self) -> EventCreationStatus {
        EventCreationStatus::Overloaded
    }
}
