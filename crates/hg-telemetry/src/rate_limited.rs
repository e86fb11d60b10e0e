//! Rate-limited logging.
//!
//! Guards a log site so it emits at most one line per period. Callers keep
//! using `tracing` macros directly so targets and fields stay theirs:
//!
//! ```rust,ignore
//! if let Some(suppressed) = self.branch_logger.admit() {
//!     tracing::error!(suppressed, node_id = %creator, "Branch detected");
//! }
//! ```

use shared_types::{Clock, RateLimiter};
use std::sync::Arc;
use std::time::Duration;

/// Admits one log line per period and counts the rest.
#[derive(Debug)]
pub struct RateLimitedLogger {
    limiter: RateLimiter,
    /// Lines suppressed since the last admitted line.
    pending_suppressed: u64,
    emitted: u64,
    suppressed: u64,
}

impl RateLimitedLogger {
    pub fn new(clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            limiter: RateLimiter::with_period(clock, period),
            pending_suppressed: 0,
            emitted: 0,
            suppressed: 0,
        }
    }

    /// Returns `Some(n)` if the caller may log now, where `n` is the number of
    /// lines suppressed since the previous admitted one. Returns `None` if the
    /// line must be dropped.
    pub fn admit(&mut self) -> Option<u64> {
        if self.limiter.request_and_trigger() {
            self.emitted += 1;
            Some(std::mem::take(&mut self.pending_suppressed))
        } else {
            self.pending_suppressed += 1;
            self.suppressed += 1;
            None
        }
    }

    /// Total lines admitted.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Total lines suppressed.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}
