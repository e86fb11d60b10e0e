//! Ordered combination of rules.

use super::rule::EventCreationRule;
use super::status::EventCreationStatus;
use tracing::debug;

/// Runs rules in construction order and stops at the first denial.
///
/// The denying rule's status is cached and returned by
/// `event_creation_status()`. With no rules, creation is always permitted.
pub struct AggregateEventCreationRules {
    rules: Vec<Box<dyn EventCreationRule>>,
    status: EventCreationStatus,
    blocked: bool,
}

impl AggregateEventCreationRules {
    pub fn of(rules: Vec<Box<dyn EventCreationRule>>) -> Self {
        Self {
            rules,
            status: EventCreationStatus::Idle,
            blocked: false,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl EventCreationRule for AggregateEventCreationRules {
    fn is_event_creation_permitted(&mut self) -> bool {
        let mut denied = None;
        for rule in &mut self.rules {
            if !rule.is_event_creation_permitted() {
                denied = Some(rule.event_creation_status());
                break;
            }
        }

        match denied {
            Some(status) => {
                if !self.blocked || status != self.status {
                    debug!(status = %status, "[hg-02] Event creation blocked");
                }
                self.status = status;
                self.blocked = true;
                false
            }
            None => {
                if self.blocked {
                    debug!(previous = %self.status, "[hg-02] Event creation unblocked");
                }
                self.blocked = false;
                true
            }
        }
    }

    fn event_was_created(&mut self) {
        for rule in &mut self.rules {
            rule.event_was_created();
        }
    }

    fn event_creation_status(&self) -> EventCreationStatus {
        self.status
    }
}
