//! Outbound (driven) ports.
//!
//! Values the rules read on every permit check. Implementations must be cheap
//! and non-blocking. Closures of the right shape implement each port, which is
//! how most callers wire them up:
//!
//! ```rust,ignore
//! let depth: Arc<dyn IntakeQueueDepth> = Arc::new(move || queue.len());
//! ```

use shared_types::PlatformStatus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Number of events waiting in the intake pipeline.
pub trait IntakeQueueDepth: Send + Sync {
    fn intake_queue_depth(&self) -> usize;
}

/// The node's current platform status.
pub trait PlatformStatusSource: Send + Sync {
    fn platform_status(&self) -> PlatformStatus;
}

/// Whether signature (priority) transactions are waiting to be put in an event.
pub trait SignatureTransactionSource: Send + Sync {
    fn has_buffered_signature_transactions(&self) -> bool;
}

/// How long the node has been continuously unhealthy. Zero when healthy.
pub trait UnhealthyDurationSource: Send + Sync {
    fn unhealthy_duration(&self) -> Duration;
}

impl<F> IntakeQueueDepth for F
where
    F: Fn() -> usize + Send + Sync,
{
    fn intake_queue_depth(&self) -> usize {
        self()
    }
}

impl<F> PlatformStatusSource for F
where
    F: Fn() -> PlatformStatus + Send + Sync,
{
    fn platform_status(&self) -> PlatformStatus {
        self()
    }
}

impl<F> SignatureTransactionSource for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn has_buffered_signature_transactions(&self) -> bool {
        self()
    }
}

impl<F> UnhealthyDurationSource for F
where
    F: Fn() -> Duration + Send + Sync,
{
    fn unhealthy_duration(&self) -> Duration {
        self()
    }
}

impl IntakeQueueDepth for AtomicUsize {
    fn intake_queue_depth(&self) -> usize {
        self.load(Ordering::Relaxed)
    }
}
