//! # Branch Reporter
//!
//! Accounts for branching creators by stake and makes branching visible:
//! per-node error logs, an escalation once flagged stake passes one third of
//! the total, and metrics.
//!
//! ## Metrics
//!
//! | Metric | Type | Meaning |
//! |--------|------|---------|
//! | `hg_branching_events_total` | counter | every reported branching event |
//! | `hg_branching_node_count` | gauge | creators currently flagged |
//! | `hg_branching_weight_fraction` | gauge | flagged stake / total stake |

use crate::config::BranchReporterConfig;
use crate::error::{BranchError, Result};
use hg_telemetry::{MetricsSink, RateLimitedLogger};
use shared_types::{Clock, EventDescriptor, EventWindow, NodeId, PlatformEvent, Roster};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const METRIC_BRANCHING_EVENTS: &str = "hg_branching_events_total";
pub const METRIC_BRANCHING_NODE_COUNT: &str = "hg_branching_node_count";
pub const METRIC_BRANCHING_WEIGHT_FRACTION: &str = "hg_branching_weight_fraction";

const UNKNOWN_CREATOR_LOG_PERIOD: Duration = Duration::from_secs(60);

/// Reports branching events.
///
/// INVARIANTS:
/// - `branching_weight` equals the summed weight of the slots holding a descriptor
/// - `branching_node_count` equals the number of slots holding a descriptor
#[derive(Debug)]
pub struct BranchReporter {
    roster: Arc<Roster>,
    metrics: Arc<dyn MetricsSink>,
    /// Most recent branching event per roster slot.
    most_recent_branch: Vec<Option<EventDescriptor>>,
    branching_node_count: usize,
    branching_weight: u64,
    event_window: Option<EventWindow>,
    node_logs: Vec<RateLimitedLogger>,
    excessive_branching_log: RateLimitedLogger,
    unknown_creator_log: RateLimitedLogger,
}

impl BranchReporter {
    pub fn new(
        roster: Arc<Roster>,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn MetricsSink>,
        config: &BranchReporterConfig,
    ) -> Self {
        let node_logs = (0..roster.len())
            .map(|_| RateLimitedLogger::new(clock.clone(), config.per_node_log_period()))
            .collect();
        let reporter = Self {
            most_recent_branch: vec![None; roster.len()],
            roster,
            metrics,
            branching_node_count: 0,
            branching_weight: 0,
            event_window: None,
            node_logs,
            excessive_branching_log: RateLimitedLogger::new(
                clock.clone(),
                config.excessive_branching_log_period(),
            ),
            unknown_creator_log: RateLimitedLogger::new(clock, UNKNOWN_CREATOR_LOG_PERIOD),
        };
        reporter.publish_gauges();
        reporter
    }

    /// Report a branching event.
    ///
    /// Every call counts towards `hg_branching_events_total`. The creator's
    /// stake is added only the first time it is flagged (until aged out).
    /// Ancient events and creators outside the roster are ignored.
    ///
    /// # Errors
    /// `EventWindowNotSet` before the first `update_event_window()`.
    pub fn report_branch(&mut self, event: &PlatformEvent) -> Result<()> {
        let window = self.event_window.ok_or(BranchError::EventWindowNotSet)?;
        if window.is_ancient(&event.descriptor) {
            return Ok(());
        }

        let creator = event.creator();
        let Some(slot) = self.roster.slot_of(creator) else {
            if let Some(suppressed) = self.unknown_creator_log.admit() {
                warn!(
                    node_id = %creator,
                    event = %event.hash(),
                    suppressed,
                    "[hg-03] Ignoring branch report for creator outside the roster"
                );
            }
            return Ok(());
        };

        if self.most_recent_branch[slot]
            .replace(event.descriptor)
            .is_none()
        {
            self.branching_node_count += 1;
            self.branching_weight += self.roster.weight_at(slot);
        }

        self.metrics.increment_counter(METRIC_BRANCHING_EVENTS, 1);
        self.publish_gauges();

        if let Some(suppressed) = self.node_logs[slot].admit() {
            error!(
                node_id = %creator,
                event = %event.descriptor,
                self_parent = ?event.self_parent.map(|p| p.hash),
                suppressed,
                "[hg-03] Node has branched"
            );
        }

        if self.is_excessive() {
            if let Some(suppressed) = self.excessive_branching_log.admit() {
                let flagged = self.flagged_nodes();
                error!(
                    severity = "fatal",
                    branching_nodes = ?flagged,
                    branching_weight = self.branching_weight,
                    total_weight = self.roster.total_weight(),
                    suppressed,
                    "[hg-03] EXCESSIVE_BRANCHING: more than one third of consensus weight is branching"
                );
            }
        }
        Ok(())
    }

    /// Set the event window and unflag creators whose last branch is now ancient.
    pub fn update_event_window(&mut self, window: EventWindow) {
        self.event_window = Some(window);

        let mut aged_out = 0usize;
        for (slot, entry) in self.most_recent_branch.iter_mut().enumerate() {
            if entry.is_some_and(|descriptor| window.is_ancient(&descriptor)) {
                *entry = None;
                self.branching_node_count -= 1;
                self.branching_weight -= self.roster.weight_at(slot);
                aged_out += 1;
            }
        }

        if aged_out > 0 {
            info!(
                aged_out,
                remaining = self.branching_node_count,
                "[hg-03] Branching flags aged out"
            );
            self.publish_gauges();
        }
    }

    /// Unset the window and zero every flag, counter and gauge.
    pub fn clear(&mut self) {
        self.event_window = None;
        self.most_recent_branch.fill(None);
        self.branching_node_count = 0;
        self.branching_weight = 0;
        self.publish_gauges();
    }

    /// Creators currently flagged.
    pub fn branching_node_count(&self) -> usize {
        self.branching_node_count
    }

    /// Summed stake of the flagged creators.
    pub fn branching_weight(&self) -> u64 {
        self.branching_weight
    }

    /// Flagged stake as a fraction of total stake.
    pub fn branching_weight_fraction(&self) -> f64 {
        match self.roster.total_weight() {
            0 => 0.0,
            total => self.branching_weight as f64 / total as f64,
        }
    }

    /// Flagged creators in ascending id order.
    pub fn flagged_nodes(&self) -> Vec<NodeId> {
        self.most_recent_branch
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .filter_map(|(slot, _)| self.roster.node_at(slot))
            .collect()
    }

    /// The most recent branching event of `creator`, if it is flagged.
    pub fn most_recent_branch(&self, creator: NodeId) -> Option<EventDescriptor> {
        self.roster
            .slot_of(creator)
            .and_then(|slot| self.most_recent_branch[slot])
    }

    /// Excessive-branching lines actually logged.
    pub fn excessive_branching_alerts(&self) -> u64 {
        self.excessive_branching_log.emitted()
    }

    pub fn event_window(&self) -> Option<EventWindow> {
        self.event_window
    }

    /// Flagged stake strictly above one third of the total.
    fn is_excessive(&self) -> bool {
        u128::from(self.branching_weight) * 3 > u128::from(self.roster.total_weight())
    }

    fn publish_gauges(&self) {
        self.metrics
            .set_gauge(METRIC_BRANCHING_NODE_COUNT, self.branching_node_count as f64);
        self.metrics
            .set_gauge(METRIC_BRANCHING_WEIGHT_FRACTION, self.branching_weight_fraction());
    }
}
