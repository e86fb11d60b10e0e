//! # Transaction Pool Nexus
//!
//! Two FIFO queues behind one mutex. Every public operation takes the lock
//! once, does O(1) amortized work, and releases it before publishing metrics.

use super::config::TransactionPoolConfig;
use super::errors::Result;
use hg_telemetry::MetricsSink;
use parking_lot::Mutex;
use shared_types::PlatformStatus;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Gauge: buffered priority transactions.
pub const METRIC_PRIORITY_DEPTH: &str = "hg_txpool_priority_depth";
/// Gauge: buffered normal transactions.
pub const METRIC_NORMAL_DEPTH: &str = "hg_txpool_normal_depth";
/// Counter: submissions rejected for any reason.
pub const METRIC_REJECTED: &str = "hg_txpool_rejected_total";

/// Why a submission was turned away. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Unhealthy,
    NotActive(PlatformStatus),
    Empty,
    TooLarge(usize),
    Throttled(usize),
}

/// Queue depths after an enqueue, or why it was refused.
type Admission = std::result::Result<(usize, usize), Rejection>;

#[derive(Debug)]
struct PoolState {
    priority: VecDeque<Vec<u8>>,
    normal: VecDeque<Vec<u8>>,
    buffered_bytes: usize,
    platform_status: PlatformStatus,
    healthy: bool,
}

impl PoolState {
    fn new() -> Self {
        Self {
            priority: VecDeque::new(),
            normal: VecDeque::new(),
            buffered_bytes: 0,
            platform_status: PlatformStatus::default(),
            healthy: true,
        }
    }

    fn total_count(&self) -> usize {
        self.priority.len() + self.normal.len()
    }

    fn depths(&self) -> (usize, usize) {
        (self.priority.len(), self.normal.len())
    }
}

/// Buffers transactions for inclusion in self events.
///
/// INVARIANTS:
/// - A `get_transactions()` result never exceeds `max_transaction_bytes_per_event`
/// - Priority transactions are selected before normal ones, FIFO within each class
/// - Priority submissions are never throttled
#[derive(Debug)]
pub struct TransactionPoolNexus {
    config: TransactionPoolConfig,
    state: Mutex<PoolState>,
    metrics: Arc<dyn MetricsSink>,
}

impl TransactionPoolNexus {
    /// Creates an empty nexus.
    ///
    /// # Errors
    /// Returns the config's validation error.
    pub fn new(config: TransactionPoolConfig, metrics: Arc<dyn MetricsSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(PoolState::new()),
            metrics,
        })
    }

    pub fn config(&self) -> &TransactionPoolConfig {
        &self.config
    }

    /// Submit an application transaction.
    ///
    /// Rejected while the node is unhealthy or not `ACTIVE`, and for empty or
    /// oversized payloads. Otherwise behaves as a normal `submit_transaction`.
    /// Admission and enqueue happen under one lock acquisition.
    pub fn submit_application_transaction(&self, payload: Vec<u8>) -> bool {
        let outcome = {
            let mut state = self.state.lock();
            match self.admit_application(&state, &payload) {
                Some(reason) => Err(reason),
                None => self.enqueue(&mut state, payload, false),
            }
        };
        self.settle(outcome)
    }

    /// Buffer a transaction.
    ///
    /// Normal submissions are rejected once `throttle_transaction_queue_size`
    /// transactions are buffered. Priority submissions always succeed.
    pub fn submit_transaction(&self, payload: Vec<u8>, priority: bool) -> bool {
        let outcome = {
            let mut state = self.state.lock();
            self.enqueue(&mut state, payload, priority)
        };
        self.settle(outcome)
    }

    fn admit_application(&self, state: &PoolState, payload: &[u8]) -> Option<Rejection> {
        if !state.healthy {
            Some(Rejection::Unhealthy)
        } else if state.platform_status != PlatformStatus::Active {
            Some(Rejection::NotActive(state.platform_status))
        } else if payload.is_empty() {
            Some(Rejection::Empty)
        } else if payload.len() > self.config.maximum_transaction_size {
            Some(Rejection::TooLarge(payload.len()))
        } else {
            None
        }
    }

    /// Caller holds the lock.
    fn enqueue(
        &self,
        state: &mut PoolState,
        payload: Vec<u8>,
        priority: bool,
    ) -> Admission {
        let depth = state.total_count();
        if !priority && depth >= self.config.throttle_transaction_queue_size {
            return Err(Rejection::Throttled(depth));
        }
        state.buffered_bytes += payload.len();
        if priority {
            state.priority.push_back(payload);
        } else {
            state.normal.push_back(payload);
        }
        Ok(state.depths())
    }

    /// Publish the outcome of a submission once the lock is released.
    fn settle(&self, outcome: Admission) -> bool {
        match outcome {
            Ok(depths) => {
                self.publish_depths(depths);
                true
            }
            Err(reason) => {
                self.reject(reason);
                false
            }
        }
    }

    /// Take the transactions for the next event.
    ///
    /// Pops the priority queue, then the normal queue, while the next item
    /// fits the remaining byte budget. Stops at the first item that does not
    /// fit, leaving it and everything behind it in place.
    pub fn get_transactions(&self) -> Vec<Vec<u8>> {
        let (selected, depths) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let mut budget = self.config.max_transaction_bytes_per_event;
            let mut selected = Vec::new();

            let mut blocked = false;
            for queue in [&mut state.priority, &mut state.normal] {
                while let Some(front) = queue.front() {
                    if front.len() > budget {
                        blocked = true;
                        break;
                    }
                    budget -= front.len();
                    if let Some(payload) = queue.pop_front() {
                        state.buffered_bytes -= payload.len();
                        selected.push(payload);
                    }
                }
                if blocked {
                    break;
                }
            }
            (selected, state.depths())
        };

        if !selected.is_empty() {
            self.publish_depths(depths);
        }
        selected
    }

    /// True while any priority transaction is buffered.
    pub fn has_buffered_signature_transactions(&self) -> bool {
        !self.state.lock().priority.is_empty()
    }

    pub fn update_platform_status(&self, status: PlatformStatus) {
        let previous = std::mem::replace(&mut self.state.lock().platform_status, status);
        if previous != status {
            debug!(from = %previous, to = %status, "[hg-01] Platform status updated");
        }
    }

    /// Record how long the node has been continuously unhealthy.
    /// `Duration::ZERO` means healthy.
    pub fn report_unhealthy_duration(&self, duration: Duration) {
        let healthy = duration <= self.config.maximum_permissible_unhealthy_duration();
        let previous = std::mem::replace(&mut self.state.lock().healthy, healthy);
        if previous != healthy {
            info!(
                healthy,
                unhealthy_ms = duration.as_millis() as u64,
                "[hg-01] Transaction intake health changed"
            );
        }
    }

    /// Drop every buffered transaction.
    pub fn clear(&self) {
        let dropped = {
            let mut state = self.state.lock();
            let dropped = state.total_count();
            state.priority.clear();
            state.normal.clear();
            state.buffered_bytes = 0;
            dropped
        };
        info!(dropped, "[hg-01] Transaction pool cleared");
        self.publish_depths((0, 0));
    }

    pub fn priority_count(&self) -> usize {
        self.state.lock().priority.len()
    }

    pub fn normal_count(&self) -> usize {
        self.state.lock().normal.len()
    }

    pub fn total_count(&self) -> usize {
        self.state.lock().total_count()
    }

    /// Sum of the sizes of all buffered transactions.
    pub fn buffered_bytes(&self) -> usize {
        self.state.lock().buffered_bytes
    }

    pub fn platform_status(&self) -> PlatformStatus {
        self.state.lock().platform_status
    }

    pub fn is_healthy(&self) -> bool {
        self.state.lock().healthy
    }

    fn publish_depths(&self, (priority, normal): (usize, usize)) {
        self.metrics.set_gauge(METRIC_PRIORITY_DEPTH, priority as f64);
        self.metrics.set_gauge(METRIC_NORMAL_DEPTH, normal as f64);
    }

    fn reject(&self, reason: Rejection) {
        debug!(reason = ?reason, "[hg-01] Transaction rejected");
        self.metrics.increment_counter(METRIC_REJECTED, 1);
    }
}
