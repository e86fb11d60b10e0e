//! # Branch Detector
//!
//! Remembers the most recent event of every roster node. An incoming event
//! whose self parent is not that event is a branch.

use crate::error::{BranchError, Result};
use hg_telemetry::RateLimitedLogger;
use shared_types::{Clock, EventDescriptor, EventWindow, NodeId, PlatformEvent, Roster};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const UNKNOWN_CREATOR_LOG_PERIOD: Duration = Duration::from_secs(60);

/// Detects branching events.
///
/// INVARIANTS:
/// - At most one tracked descriptor per creator (one slot per roster entry)
/// - Slots made ancient by a window advance are emptied and stay empty until
///   that creator's next non-ancient event
#[derive(Debug)]
pub struct BranchDetector {
    roster: Arc<Roster>,
    /// Indexed by roster slot.
    most_recent: Vec<Option<EventDescriptor>>,
    event_window: Option<EventWindow>,
    unknown_creator_log: RateLimitedLogger,
}

impl BranchDetector {
    pub fn new(roster: Arc<Roster>, clock: Arc<dyn Clock>) -> Self {
        let most_recent = vec![None; roster.len()];
        Self {
            roster,
            most_recent,
            event_window: None,
            unknown_creator_log: RateLimitedLogger::new(clock, UNKNOWN_CREATOR_LOG_PERIOD),
        }
    }

    /// Check `event` for branching and record it as its creator's most recent.
    ///
    /// Returns the event's descriptor if it branches. Ancient events and events
    /// from creators outside the roster return `None` and change nothing.
    ///
    /// # Errors
    /// `EventWindowNotSet` before the first `update_event_window()`.
    pub fn check_for_branches(&mut self, event: &PlatformEvent) -> Result<Option<EventDescriptor>> {
        let window = self.event_window.ok_or(BranchError::EventWindowNotSet)?;
        if window.is_ancient(&event.descriptor) {
            return Ok(None);
        }

        let creator = event.creator();
        let Some(slot) = self.roster.slot_of(creator) else {
            if let Some(suppressed) = self.unknown_creator_log.admit() {
                warn!(
                    node_id = %creator,
                    event = %event.hash(),
                    suppressed,
                    "[hg-03] Ignoring event from creator outside the roster"
                );
            }
            return Ok(None);
        };

        let previous = self.most_recent[slot].replace(event.descriptor);
        let branching = matches!(previous, Some(previous) if event.self_parent != Some(previous));

        if branching {
            debug!(
                node_id = %creator,
                event = %event.descriptor,
                "[hg-03] Branching event detected"
            );
            Ok(Some(event.descriptor))
        } else {
            Ok(None)
        }
    }

    /// Set the event window and forget creators whose tracked event is now ancient.
    pub fn update_event_window(&mut self, window: EventWindow) {
        self.event_window = Some(window);
        for slot in &mut self.most_recent {
            if slot.is_some_and(|descriptor| window.is_ancient(&descriptor)) {
                *slot = None;
            }
        }
    }

    /// Unset the window and forget every creator.
    pub fn clear(&mut self) {
        self.event_window = None;
        self.most_recent.fill(None);
    }

    pub fn event_window(&self) -> Option<EventWindow> {
        self.event_window
    }

    /// The tracked most recent event of `creator`, if any.
    pub fn most_recent_event(&self, creator: NodeId) -> Option<EventDescriptor> {
        self.roster
            .slot_of(creator)
            .and_then(|slot| self.most_recent[slot])
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{AncientMode, FakeClock, Hash};

    fn detector() -> BranchDetector {
        let roster = Roster::from_weights([(1, 1), (2, 1), (3, 1)]).unwrap();
        BranchDetector::new(Arc::new(roster), Arc::new(FakeClock::new()))
    }

    fn descriptor(creator: u64, tag: &str, round: u64) -> EventDescriptor {
        EventDescriptor::new(Hash::digest(tag.as_bytes()), NodeId(creator), round, round)
    }

    fn event(me: EventDescriptor, parent: Option<EventDescriptor>) -> PlatformEvent {
        PlatformEvent::new(me, parent, 0)
    }

    fn window(threshold: u64) -> EventWindow {
        EventWindow::new(threshold, threshold, AncientMode::BirthRoundThreshold)
    }

    // =========================================================================
    // Usage contract
    // =========================================================================

    #[test]
    fn test_check_before_window_fails() {
        let mut detector = detector();
        let e1 = event(descriptor(1, "e1", 1), None);
        assert_eq!(
            detector.check_for_branches(&e1),
            Err(BranchError::EventWindowNotSet)
        );
    }

    // =========================================================================
    // Detection
    // =========================================================================

    #[test]
    fn test_linear_chain_is_not_a_branch() {
        let mut detector = detector();
        detector.update_event_window(window(0));

        let e1 = descriptor(1, "e1", 1);
        let e2 = descriptor(1, "e2", 2);
        assert_eq!(detector.check_for_branches(&event(e1, None)), Ok(None));
        assert_eq!(detector.check_for_branches(&event(e2, Some(e1))), Ok(None));
        assert_eq!(detector.most_recent_event(NodeId(1)), Some(e2));
    }

    #[test]
    fn test_divergent_self_parent_is_a_branch() {
        let mut detector = detector();
        detector.update_event_window(window(0));

        let e1 = descriptor(1, "e1", 1);
        let e3 = descriptor(1, "e3", 1);
        assert_eq!(detector.check_for_branches(&event(e1, None)), Ok(None));
        assert_eq!(detector.check_for_branches(&event(e3, None)), Ok(Some(e3)));
    }

    #[test]
    fn test_every_divergent_event_is_flagged() {
        let mut detector = detector();
        detector.update_event_window(window(0));

        let root = descriptor(2, "root", 1);
        let a = descriptor(2, "a", 2);
        let b = descriptor(2, "b", 2);
        let c = descriptor(2, "c", 2);
        detector.check_for_branches(&event(root, None)).unwrap();
        assert_eq!(detector.check_for_branches(&event(a, Some(root))), Ok(None));
        assert_eq!(detector.check_for_branches(&event(b, Some(root))), Ok(Some(b)));
        assert_eq!(detector.check_for_branches(&event(c, Some(root))), Ok(Some(c)));
        // Continuing from the latest branch is not a branch
        let d = descriptor(2, "d", 3);
        assert_eq!(detector.check_for_branches(&event(d, Some(c))), Ok(None));
    }

    #[test]
    fn test_creators_are_independent() {
        let mut detector = detector();
        detector.update_event_window(window(0));

        let a1 = descriptor(1, "a1", 1);
        let b1 = descriptor(2, "b1", 1);
        assert_eq!(detector.check_for_branches(&event(a1, None)), Ok(None));
        assert_eq!(detector.check_for_branches(&event(b1, None)), Ok(None));
    }

    // =========================================================================
    // Event window
    // =========================================================================

    #[test]
    fn test_ancient_events_are_ignored() {
        let mut detector = detector();
        detector.update_event_window(window(5));

        let old = descriptor(1, "old", 4);
        assert_eq!(detector.check_for_branches(&event(old, None)), Ok(None));
        assert_eq!(detector.most_recent_event(NodeId(1)), None);
    }

    #[test]
    fn test_window_advance_forgets_ancient_events() {
        let mut detector = detector();
        detector.update_event_window(window(0));

        let e1 = descriptor(1, "e1", 1);
        let e3 = descriptor(1, "e3", 1);
        detector.check_for_branches(&event(e1, None)).unwrap();
        assert_eq!(detector.check_for_branches(&event(e3, None)), Ok(Some(e3)));

        detector.update_event_window(window(2));
        assert_eq!(detector.most_recent_event(NodeId(1)), None);

        let e4 = descriptor(1, "e4", 2);
        assert_eq!(detector.check_for_branches(&event(e4, None)), Ok(None));
    }

    #[test]
    fn test_window_advance_keeps_recent_events() {
        let mut detector = detector();
        detector.update_event_window(window(0));

        let e1 = descriptor(1, "e1", 5);
        detector.check_for_branches(&event(e1, None)).unwrap();
        detector.update_event_window(window(5));
        assert_eq!(detector.most_recent_event(NodeId(1)), Some(e1));
    }

    #[test]
    fn test_unknown_creator_is_ignored() {
        let mut detector = detector();
        detector.update_event_window(window(0));

        let stranger = descriptor(99, "x", 1);
        let other = descriptor(99, "y", 1);
        assert_eq!(detector.check_for_branches(&event(stranger, None)), Ok(None));
        assert_eq!(detector.check_for_branches(&event(other, None)), Ok(None));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut detector = detector();
        detector.update_event_window(window(0));
        detector
            .check_for_branches(&event(descriptor(1, "e1", 1), None))
            .unwrap();

        detector.clear();
        assert_eq!(detector.event_window(), None);
        assert_eq!(detector.most_recent_event(NodeId(1)), None);
        assert!(detector
            .check_for_branches(&event(descriptor(1, "e2", 1), None))
            .is_err());
    }
}
