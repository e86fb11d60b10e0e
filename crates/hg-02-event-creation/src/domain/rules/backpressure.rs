//! Stops creation while the intake pipeline is backed up.

use crate::domain::rule::EventCreationRule;
use crate::domain::status::EventCreationStatus;
use crate::ports::IntakeQueueDepth;
use std::sync::Arc;

/// Permits creation while the intake queue holds fewer than `threshold` events.
pub struct BackpressureRule {
    intake_queue: Arc<dyn IntakeQueueDepth>,
    threshold: usize,
}

impl BackpressureRule {
    pub fn new(intake_queue: Arc<dyn IntakeQueueDepth>, threshold: usize) -> Self {
        Self {
            intake_queue,
            threshold,
        }
    }
}

impl EventCreationRule for BackpressureRule {
    fn is_event_creation_permitted(&mut self) -> bool {
        self.intake_queue.intake_queue_depth() < self.threshold
    }

    fn event_was_created(&mut self) {}

    fn event_creation_status(&self) -> EventCreationStatus {
        EventCreationStatus::Overloaded
    }
}
