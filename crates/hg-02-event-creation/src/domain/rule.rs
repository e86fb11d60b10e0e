//! The event creation rule contract.

use super::status::{CreationDecision, EventCreationStatus};

/// A gate on self event creation.
///
/// Rules are plain state machines driven by one caller thread. The only
/// mutation a caller makes is `event_was_created()`.
pub trait EventCreationRule: Send {
    /// May an event be created now?
    fn is_event_creation_permitted(&mut self) -> bool;

    /// An event was just created. Rules with bookkeeping update it here.
    fn event_was_created(&mut self);

    /// Why creation is blocked.
    ///
    /// Only meaningful right after `is_event_creation_permitted()` returned
    /// `false` on this same rule.
    fn event_creation_status(&self) -> EventCreationStatus;

    /// `is_event_creation_permitted` and `event_creation_status` in one call.
    fn check(&mut self) -> CreationDecision {
        if self.is_event_creation_permitted() {
            CreationDecision::Permitted
        } else {
            CreationDecision::Blocked(self.event_creation_status())
        }
    }
}

impl<R: EventCreationRule + ?Sized> EventCreationRule for Box<R> {
    fn is_event_creation_permitted(&mut self) -> bool {
        (**self).is_event_creation_permitted()
    }

    fn event_was_created(&mut self) {
        (**self).event_was_created()
    }

    fn event_creation_status(&self) -> EventCreationStatus {
        (**self).event_creation_status()
    }

    fn check(&mut self) -> CreationDecision {
        (**self).check()
    }
}
