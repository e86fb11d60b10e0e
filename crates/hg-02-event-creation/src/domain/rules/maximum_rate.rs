//! Caps the event creation rate.

use crate::domain::rule::EventCreationRule;
use crate::domain::status::EventCreationStatus;
use shared_types::{Clock, RateLimiter};
use std::sync::Arc;

/// Token bucket over created events.
///
/// A rate of zero or below (or NaN) means unlimited. Otherwise, over any
/// interval of length Δ at most `⌈rate·Δ⌉ + 1` events are permitted when each
/// permit is followed by `event_was_created()`.
#[derive(Debug)]
pub struct MaximumRateRule {
    limiter: Option<RateLimiter>,
}

impl MaximumRateRule {
    pub fn new(clock: Arc<dyn Clock>, max_events_per_second: f64) -> Self {
        let limiter = (max_events_per_second > 0.0)
            .then(|| RateLimiter::new(clock, 1, max_events_per_second));
        Self { limiter }
    }

    /// True if this rule never blocks.
    pub fn is_unlimited(&self) -> bool {
        self.limiter.is_none()
    }
}

impl EventCreationRule for MaximumRateRule {
    fn is_event_creation_permitted(&mut self) -> bool {
        self.limiter.as_mut().map_or(true, RateLimiter::request)
    }

    fn event_was_created(&mut self) {
        if let Some(limiter) = self.limiter.as_mut() {
            limiter.trigger();
        }
    }

    fn event_creation_status(&self) -> EventCreationStatus {
        EventCreationStatus::RateLimited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::FakeClock;
    use std::time::Duration;

    fn rule(rate: f64) -> (Arc<FakeClock>, MaximumRateRule) {
        let clock = Arc::new(FakeClock::new());
        let rule = MaximumRateRule::new(clock.clone(), rate);
        (clock, rule)
    }

    #[test]
    fn test_non_positive_rate_is_unlimited() {
        for rate in [0.0, -5.0, f64::NAN] {
            let (_clock, mut rule) = rule(rate);
            assert!(rule.is_unlimited());
            for _ in 0..1000 {
                assert!(rule.is_event_creation_permitted());
                rule.event_was_created();
            }
        }
    }

    #[test]
    fn test_one_event_per_period() {
        // 4/s: one token every 250ms
        let (clock, mut rule) = rule(4.0);

        assert!(rule.is_event_creation_permitted());
        rule.event_was_created();
        assert!(!rule.is_event_creation_permitted());
        assert_eq!(rule.event_creation_status(), EventCreationStatus::RateLimited);

        clock.advance(Duration::from_millis(125));
        assert!(!rule.is_event_creation_permitted());

        clock.advance(Duration::from_millis(125));
        assert!(rule.is_event_creation_permitted());
    }

    #[test]
    fn test_permit_without_creation_does_not_consume() {
        let (_clock, mut rule) = rule(1.0);
        for _ in 0..10 {
            assert!(rule.is_event_creation_permitted());
        }
    }

    proptest! {
        #[test]
        fn test_permits_bounded_by_rate(
            rate in 1u32..50,
            steps in proptest::collection::vec(1u64..200, 1..200),
        ) {
            let (clock, mut rule) = rule(f64::from(rate));
            let mut granted = 0u64;
            let mut elapsed_ms = 0u64;

            for step in steps {
                if rule.is_event_creation_permitted() {
                    rule.event_was_created();
                    granted += 1;
                }
                clock.advance(Duration::from_millis(step));
                elapsed_ms += step;
            }

            // Permits happen at times within [0, elapsed_ms - last step].
            let bound = (f64::from(rate) * elapsed_ms as f64 / 1000.0).ceil() as u64 + 1;
            prop_assert!(granted <= bound, "granted {} > bound {}", granted, bound);
        }
    }
}
