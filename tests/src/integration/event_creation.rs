//! # Transaction Pool → Event Creation Rules
//!
//! The standard rule set reading the platform status and pending signature
//! transactions straight from a `TransactionPoolNexus`, with the intake queue
//! depth and unhealthy duration pushed by the test.

#[cfg(test)]
mod tests {
    use hg_01_transaction_pool::{TransactionPoolConfig, TransactionPoolNexus};
    use hg_02_event_creation::{
        standard_rules, AggregateEventCreationRules, CreationDecision, EventCreationConfig,
        EventCreationRule, EventCreationStatus, RulePorts,
    };
    use hg_telemetry::InMemoryMetrics;
    use rand::Rng;
    use shared_types::{FakeClock, PlatformStatus};
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Node {
        clock: Arc<FakeClock>,
        nexus: Arc<TransactionPoolNexus>,
        intake_depth: Arc<AtomicUsize>,
        unhealthy_ms: Arc<AtomicU64>,
        rules: AggregateEventCreationRules,
    }

    impl Node {
        fn new() -> Self {
            let clock = Arc::new(FakeClock::new());
            let nexus = Arc::new(
                TransactionPoolNexus::new(
                    TransactionPoolConfig::for_testing(),
                    Arc::new(InMemoryMetrics::new()),
                )
                .unwrap(),
            );
            let intake_depth = Arc::new(AtomicUsize::new(0));
            let unhealthy_ms = Arc::new(AtomicU64::new(0));

            let config = EventCreationConfig {
                max_creation_rate: 20.0,
                event_intake_throttle: 4,
                maximum_permissible_unhealthy_duration_ms: 1000,
            };
            let unhealthy = unhealthy_ms.clone();
            let rules = standard_rules(
                &config,
                RulePorts {
                    clock: clock.clone(),
                    intake_queue: intake_depth.clone(),
                    platform_status: nexus.clone(),
                    signature_transactions: nexus.clone(),
                    unhealthy_duration: Arc::new(move || {
                        Duration::from_millis(unhealthy.load(Ordering::SeqCst))
                    }),
                },
            )
            .unwrap();

            Self {
                clock,
                nexus,
                intake_depth,
                unhealthy_ms,
                rules,
            }
        }

        /// One pass of the creation loop: check, take transactions, notify.
        fn try_create_event(&mut self) -> Result<Vec<Vec<u8>>, EventCreationStatus> {
            match self.rules.check() {
                CreationDecision::Permitted => {
                    let transactions = self.nexus.get_transactions();
                    self.rules.event_was_created();
                    Ok(transactions)
                }
                CreationDecision::Blocked(status) => Err(status),
            }
        }
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[test]
    fn test_creation_waits_for_active_status() {
        let mut node = Node::new();
        assert_eq!(
            node.try_create_event(),
            Err(EventCreationStatus::PlatformStatus)
        );

        node.nexus.update_platform_status(PlatformStatus::Active);
        assert_eq!(node.try_create_event(), Ok(Vec::new()));
    }

    #[test]
    fn test_events_carry_pooled_transactions_at_the_configured_rate() {
        let mut node = Node::new();
        node.nexus.update_platform_status(PlatformStatus::Active);

        let mut rng = rand::thread_rng();
        let mut submitted = Vec::new();
        for _ in 0..8 {
            let payload = vec![0xAB; rng.gen_range(1..=64)];
            assert!(node.nexus.submit_application_transaction(payload.clone()));
            submitted.push(payload);
        }

        let mut embedded = Vec::new();
        while node.nexus.total_count() > 0 {
            match node.try_create_event() {
                Ok(transactions) => {
                    assert!(transactions.iter().map(Vec::len).sum::<usize>() <= 256);
                    embedded.extend(transactions);
                }
                Err(status) => {
                    assert_eq!(status, EventCreationStatus::RateLimited);
                    node.clock.advance(Duration::from_millis(50));
                }
            }
        }
        assert_eq!(embedded, submitted);
    }

    #[test]
    fn test_backpressure_and_health_block_creation() {
        let mut node = Node::new();
        node.nexus.update_platform_status(PlatformStatus::Active);

        node.intake_depth.store(4, Ordering::SeqCst);
        assert_eq!(node.try_create_event(), Err(EventCreationStatus::Overloaded));
        node.intake_depth.store(3, Ordering::SeqCst);

        node.unhealthy_ms.store(2000, Ordering::SeqCst);
        node.nexus
            .report_unhealthy_duration(Duration::from_millis(2000));
        assert_eq!(node.try_create_event(), Err(EventCreationStatus::Overloaded));
        assert!(!node.nexus.submit_application_transaction(vec![1]));

        node.unhealthy_ms.store(0, Ordering::SeqCst);
        node.nexus.report_unhealthy_duration(Duration::ZERO);
        assert!(node.try_create_event().is_ok());
    }

    #[test]
    fn test_freezing_node_only_creates_events_for_signatures() {
        let mut node = Node::new();
        node.nexus.update_platform_status(PlatformStatus::Freezing);
        assert_eq!(
            node.try_create_event(),
            Err(EventCreationStatus::PlatformStatus)
        );
        // Application transactions are refused outside ACTIVE
        assert!(!node.nexus.submit_application_transaction(vec![1, 2, 3]));

        let signature = vec![0x51; 32];
        assert!(node.nexus.submit_transaction(signature.clone(), true));
        assert_eq!(node.try_create_event(), Ok(vec![signature]));

        node.clock.advance(Duration::from_secs(1));
        assert_eq!(
            node.try_create_event(),
            Err(EventCreationStatus::PlatformStatus)
        );
    }

    #[test]
    fn test_priority_transactions_bypass_the_throttle() {
        let node = Node::new();
        node.nexus.update_platform_status(PlatformStatus::Active);

        for i in 0..10u8 {
            assert!(node.nexus.submit_application_transaction(vec![i]));
        }
        assert!(!node.nexus.submit_application_transaction(vec![10]));
        assert!(node.nexus.submit_transaction(vec![0xFF], true));

        let first = node.nexus.get_transactions();
        assert_eq!(first[0], vec![0xFF]);
        assert_eq!(first.len(), 11);
    }
}
