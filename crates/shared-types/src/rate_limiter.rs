//! # Rate Limiter
//!
//! Token bucket rate limiter driven by an injected `Clock`.
//!
//! Used by the event creation rate rule and by rate-limited logging. The limiter
//! is a plain state machine (`&mut self`, no locks, no allocation); callers that
//! share one across threads wrap it themselves.

use crate::clock::Clock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Slack absorbing floating point error in refill arithmetic.
const TOKEN_EPSILON: f64 = 1e-9;

/// Token bucket rate limiter.
///
/// # Algorithm
///
/// - Tokens are added continuously at `refill_per_second`
/// - The bucket never holds more than `capacity` tokens
/// - `request()` asks whether a token is available without consuming it
/// - `trigger()` consumes one token
///
/// The bucket starts full. With capacity 1, over any interval of length Δ at most
/// `⌈rate·Δ⌉ + 1` request/trigger pairs succeed.
#[derive(Debug)]
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    /// Maximum tokens in bucket.
    capacity: f64,
    /// Tokens to add per second.
    refill_per_second: f64,
    /// Current token count.
    tokens: f64,
    /// Last refill time.
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// # Parameters
    ///
    /// - `capacity`: Maximum burst size
    /// - `refill_per_second`: Tokens per second
    pub fn new(clock: Arc<dyn Clock>, capacity: u32, refill_per_second: f64) -> Self {
        let last_refill = clock.now();
        Self {
            clock,
            capacity: f64::from(capacity),
            refill_per_second: refill_per_second.max(0.0),
            tokens: f64::from(capacity),
            last_refill,
        }
    }

    /// A limiter allowing one operation per `period`.
    pub fn with_period(clock: Arc<dyn Clock>, period: Duration) -> Self {
        let rate = if period.is_zero() {
            f64::INFINITY
        } else {
            1.0 / period.as_secs_f64()
        };
        Self::new(clock, 1, rate)
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.last_refill = now;

        if self.refill_per_second.is_infinite() {
            self.tokens = self.capacity;
            return;
        }
        let added = elapsed.as_secs_f64() * self.refill_per_second;
        self.tokens = (self.tokens + added).min(self.capacity);
    }

    /// Returns `true` if a token is available. Does not consume it.
    pub fn request(&mut self) -> bool {
        self.refill();
        self.tokens + TOKEN_EPSILON >= 1.0
    }

    /// Consume one token. An empty bucket stays empty.
    pub fn trigger(&mut self) {
        self.refill();
        self.tokens = (self.tokens - 1.0).max(0.0);
    }

    /// Consume a token if one is available.
    ///
    /// Returns `true` if the operation is allowed, `false` if rate limited.
    pub fn request_and_trigger(&mut self) -> bool {
        if self.request() {
            self.tokens = (self.tokens - 1.0).max(0.0);
            true
        } else {
            false
        }
    }

    /// Current available tokens (fractional).
    pub fn available(&mut self) -> f64 {
        self.refill();
        self.tokens
    }

    /// Check if rate limited without consuming a token.
    pub fn is_limited(&mut self) -> bool {
        !self.request()
    }
}
