//! # Branch Detector → Branch Reporter
//!
//! Events go through the detector in per-creator order; every flagged event is
//! reported. Checks stake accounting, escalation and aging across both.

#[cfg(test)]
mod tests {
    use hg_03_branch_detection::{
        BranchDetector, BranchError, BranchReporter, BranchReporterConfig,
        METRIC_BRANCHING_EVENTS, METRIC_BRANCHING_NODE_COUNT, METRIC_BRANCHING_WEIGHT_FRACTION,
    };
    use hg_telemetry::InMemoryMetrics;
    use shared_types::{
        AncientMode, EventDescriptor, EventWindow, FakeClock, Hash, NodeId, PlatformEvent, Roster,
    };
    use std::sync::Arc;
    use std::time::Duration;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Detector and reporter wired the way the consensus thread drives them.
    struct BranchPipeline {
        clock: Arc<FakeClock>,
        metrics: Arc<InMemoryMetrics>,
        detector: BranchDetector,
        reporter: BranchReporter,
    }

    impl BranchPipeline {
        /// Weights 40/30/20/10 for nodes 1..=4.
        fn new() -> Self {
            let roster = Arc::new(Roster::from_weights([(1, 40), (2, 30), (3, 20), (4, 10)]).unwrap());
            let clock = Arc::new(FakeClock::new());
            let metrics = Arc::new(InMemoryMetrics::new());
            Self {
                detector: BranchDetector::new(roster.clone(), clock.clone()),
                reporter: BranchReporter::new(
                    roster,
                    clock.clone(),
                    metrics.clone(),
                    &BranchReporterConfig::default(),
                ),
                clock,
                metrics,
            }
        }

        fn set_window(&mut self, threshold: u64) {
            let window = EventWindow::new(threshold, threshold, AncientMode::BirthRoundThreshold);
            self.detector.update_event_window(window);
            self.reporter.update_event_window(window);
        }

        /// Returns true if `event` was flagged.
        fn ingest(&mut self, event: &PlatformEvent) -> Result<bool, BranchError> {
            match self.detector.check_for_branches(event)? {
                Some(_) => {
                    self.reporter.report_branch(event)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn descriptor(creator: u64, tag: &str, round: u64) -> EventDescriptor {
        EventDescriptor::new(Hash::digest(tag.as_bytes()), NodeId(creator), round, round)
    }

    fn event(me: EventDescriptor, parent: Option<EventDescriptor>) -> PlatformEvent {
        PlatformEvent::new(me, parent, 0)
    }

    /// Extend `creator`'s chain by one event, then fork that event.
    /// Returns the branching descriptor.
    fn fork(pipeline: &mut BranchPipeline, creator: u64, round: u64) -> EventDescriptor {
        let tip = pipeline.detector.most_recent_event(NodeId(creator));
        let root = descriptor(creator, &format!("root-{creator}-{round}"), round);
        let left = descriptor(creator, &format!("left-{creator}-{round}"), round);
        let right = descriptor(creator, &format!("right-{creator}-{round}"), round);
        assert!(!pipeline.ingest(&event(root, tip)).unwrap());
        assert!(!pipeline.ingest(&event(left, Some(root))).unwrap());
        assert!(pipeline.ingest(&event(right, Some(root))).unwrap());
        right
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[test]
    fn test_honest_chains_are_never_reported() {
        let mut pipeline = BranchPipeline::new();
        pipeline.set_window(0);

        for creator in 1..=4 {
            let mut parent = None;
            for round in 1..=10 {
                let me = descriptor(creator, &format!("{creator}-{round}"), round);
                assert!(!pipeline.ingest(&event(me, parent)).unwrap());
                parent = Some(me);
            }
        }
        assert_eq!(pipeline.reporter.branching_node_count(), 0);
        assert_eq!(pipeline.metrics.counter(METRIC_BRANCHING_EVENTS), 0);
    }

    #[test]
    fn test_stake_accumulates_until_strong_minority() {
        let mut pipeline = BranchPipeline::new();
        pipeline.set_window(0);

        fork(&mut pipeline, 4, 1);
        fork(&mut pipeline, 3, 2);
        assert_eq!(pipeline.reporter.branching_weight(), 30);
        assert_eq!(pipeline.reporter.excessive_branching_alerts(), 0);

        // A repeat offender counts as an event, not as more stake
        fork(&mut pipeline, 4, 3);
        assert_eq!(pipeline.reporter.branching_weight(), 30);
        assert_eq!(pipeline.metrics.counter(METRIC_BRANCHING_EVENTS), 3);

        let latest = fork(&mut pipeline, 2, 5);
        assert_eq!(pipeline.reporter.branching_weight(), 60);
        assert_eq!(pipeline.reporter.excessive_branching_alerts(), 1);
        assert_eq!(
            pipeline.reporter.flagged_nodes(),
            vec![NodeId(2), NodeId(3), NodeId(4)]
        );
        assert_eq!(pipeline.reporter.most_recent_branch(NodeId(2)), Some(latest));
        assert_eq!(
            pipeline.metrics.gauge(METRIC_BRANCHING_WEIGHT_FRACTION),
            Some(0.6)
        );

        // Still excessive, but the escalation is rate limited
        fork(&mut pipeline, 2, 6);
        assert_eq!(pipeline.reporter.excessive_branching_alerts(), 1);
        pipeline.clock.advance(Duration::from_secs(61));
        fork(&mut pipeline, 2, 7);
        assert_eq!(pipeline.reporter.excessive_branching_alerts(), 2);
    }

    #[test]
    fn test_window_advance_ages_out_detector_and_reporter_together() {
        let mut pipeline = BranchPipeline::new();
        pipeline.set_window(0);

        fork(&mut pipeline, 4, 1);
        fork(&mut pipeline, 3, 2);
        fork(&mut pipeline, 2, 5);
        assert_eq!(pipeline.reporter.branching_node_count(), 3);

        pipeline.set_window(3);
        assert_eq!(pipeline.reporter.flagged_nodes(), vec![NodeId(2)]);
        assert_eq!(pipeline.reporter.branching_weight(), 30);
        assert_eq!(
            pipeline.metrics.gauge(METRIC_BRANCHING_NODE_COUNT),
            Some(1.0)
        );

        // Node 4 starts over: its next genesis event is not a branch
        let fresh = descriptor(4, "fresh", 3);
        assert!(!pipeline.ingest(&event(fresh, None)).unwrap());
        assert_eq!(pipeline.reporter.branching_node_count(), 1);
    }

    #[test]
    fn test_ancient_forks_are_ignored_end_to_end() {
        let mut pipeline = BranchPipeline::new();
        pipeline.set_window(5);

        let root = descriptor(1, "old-root", 2);
        let other = descriptor(1, "old-other", 2);
        assert!(!pipeline.ingest(&event(root, None)).unwrap());
        assert!(!pipeline.ingest(&event(other, None)).unwrap());
        assert_eq!(pipeline.reporter.branching_node_count(), 0);
    }

    #[test]
    fn test_usage_before_window_fails_fast() {
        let mut pipeline = BranchPipeline::new();
        let e = event(descriptor(1, "e", 1), None);
        assert_eq!(pipeline.ingest(&e), Err(BranchError::EventWindowNotSet));
        assert_eq!(
            pipeline.reporter.report_branch(&e),
            Err(BranchError::EventWindowNotSet)
        );
    }

    #[test]
    fn test_clear_resets_both_sides() {
        let mut pipeline = BranchPipeline::new();
        pipeline.set_window(0);
        fork(&mut pipeline, 1, 1);
        fork(&mut pipeline, 2, 1);
        assert_eq!(pipeline.reporter.excessive_branching_alerts(), 1);

        pipeline.detector.clear();
        pipeline.reporter.clear();
        assert_eq!(pipeline.reporter.branching_node_count(), 0);
        assert_eq!(
            pipeline.metrics.gauge(METRIC_BRANCHING_WEIGHT_FRACTION),
            Some(0.0)
        );

        pipeline.set_window(0);
        let root = descriptor(1, "root-1-1", 1);
        assert!(!pipeline.ingest(&event(root, None)).unwrap());
    }
}
