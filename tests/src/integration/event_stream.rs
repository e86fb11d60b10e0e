//! # Consensus Output → Event Stream
//!
//! Finalized rounds flow through branch detection and into the event stream,
//! which hashes and persists them until the freeze event. Also covers the
//! running hash surviving a restart and a reconnect, and a failing stage
//! taking the whole stream down with it.

#[cfg(test)]
mod tests {
    use hg_03_branch_detection::{BranchDetector, BranchReporter, BranchReporterConfig};
    use hg_04_event_stream::{
        read_signature_file, read_stream_file, ConsensusEventStream, EventSerializer,
        EventStreamConfig, RunningHash, RunningHashUpdate, StreamError, StreamPorts, StreamSigner,
        METRIC_EVENTS_DROPPED, METRIC_FILES_COMPLETED, SIGNATURE_FILE_EXTENSION,
        STREAM_FILE_EXTENSION,
    };
    use hg_telemetry::InMemoryMetrics;
    use shared_concurrency::ParallelExecutor;
    use shared_types::{
        AncientMode, ConsensusData, EventDescriptor, EventWindow, FakeClock, Hash, NodeId,
        PlatformEvent, Roster,
    };
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// "Signs" with a digest of the file hash.
    struct DigestSigner;

    impl StreamSigner for DigestSigner {
        fn sign(&self, file_hash: &Hash) -> hg_04_event_stream::Result<Vec<u8>> {
            Ok(Hash::digest(file_hash.as_bytes()).as_bytes().to_vec())
        }
    }

    struct PanickingSerializer;

    impl EventSerializer for PanickingSerializer {
        fn serialize(&self, _event: &PlatformEvent) -> hg_04_event_stream::Result<Vec<u8>> {
            panic!("serializer bug")
        }
    }

    fn ports(metrics: Arc<InMemoryMetrics>) -> StreamPorts {
        StreamPorts::new(Arc::new(FakeClock::new()), metrics, Arc::new(DigestSigner))
    }

    /// Four creators, each extending its own chain once per round.
    fn rounds(count: u64, millis_per_round: u64) -> Vec<Vec<Arc<PlatformEvent>>> {
        let mut tips: Vec<Option<EventDescriptor>> = vec![None; 4];
        let mut order = 0;
        (1..=count)
            .map(|round| {
                (0..4u64)
                    .map(|creator| {
                        let me = EventDescriptor::new(
                            Hash::digest(format!("{creator}-{round}").as_bytes()),
                            NodeId(creator + 1),
                            round,
                            round,
                        );
                        let parent = tips[creator as usize].replace(me);
                        order += 1;
                        let timestamp = round * millis_per_round + creator;
                        Arc::new(PlatformEvent::new(me, parent, timestamp).with_consensus(
                            ConsensusData {
                                round,
                                consensus_order: order,
                                consensus_timestamp_ms: timestamp,
                            },
                        ))
                    })
                    .collect()
            })
            .collect()
    }

    fn fold(seed: Hash, events: &[Arc<PlatformEvent>]) -> Hash {
        let mut running_hash = RunningHash::new(seed);
        for event in events {
            running_hash.add(&event.hash());
        }
        running_hash.value()
    }

    fn stream_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == STREAM_FILE_EXTENSION))
            .collect();
        files.sort();
        files
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[test]
    fn test_finalized_rounds_flow_until_freeze() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = Arc::new(InMemoryMetrics::new());
        let rounds = rounds(6, 1000);

        // The second event of round 4 is the last one before the freeze
        let freeze_hash = rounds[3][1].hash();
        let config = EventStreamConfig {
            log_period_ms: 2000,
            ..EventStreamConfig::persisting_to(dir.path())
        };
        let stream = ConsensusEventStream::start(
            config,
            Hash::ZERO,
            ports(metrics.clone()).with_freeze_predicate(move |e| e.hash() == freeze_hash),
        )
        .unwrap();

        let roster = Arc::new(Roster::from_weights((1..=4).map(|id| (id, 1))).unwrap());
        let clock = Arc::new(FakeClock::new());
        let mut detector = BranchDetector::new(roster.clone(), clock.clone());
        let mut reporter = BranchReporter::new(
            roster,
            clock,
            metrics.clone(),
            &BranchReporterConfig::default(),
        );
        let window = EventWindow::genesis(AncientMode::BirthRoundThreshold);
        detector.update_event_window(window);
        reporter.update_event_window(window);

        // Detection runs here while the batch is handed to the stream
        let executor = ParallelExecutor::new("round-handoff");
        for round in &rounds {
            let (flagged, ()) = executor
                .do_parallel(
                    || {
                        let mut flagged = 0;
                        for event in round {
                            if detector.check_for_branches(event)?.is_some() {
                                reporter.report_branch(event)?;
                                flagged += 1;
                            }
                        }
                        Ok(flagged)
                    },
                    || Ok(stream.add_events(round)?),
                    || {},
                )
                .unwrap();
            assert_eq!(flagged, 0);
        }
        stream.shutdown().unwrap();

        let accepted: Vec<_> = rounds.concat().into_iter().take(14).collect();
        assert_eq!(stream.events_hashed(), 14);
        assert_eq!(stream.running_hash(), fold(Hash::ZERO, &accepted));
        // Two events of round 4, then rounds 5 and 6
        assert_eq!(metrics.counter(METRIC_EVENTS_DROPPED), 10);

        // Periods of 2s: rounds {1}, {2, 3}, {4}
        let files = stream_files(dir.path());
        assert_eq!(files.len(), 3);
        assert_eq!(metrics.counter(METRIC_FILES_COMPLETED), 3);

        let parsed: Vec<_> = files.iter().map(|f| read_stream_file(f).unwrap()).collect();
        assert_eq!(
            parsed.iter().map(|f| f.events.len()).collect::<Vec<_>>(),
            vec![4, 8, 2]
        );
        assert_eq!(parsed[0].start_hash, Hash::ZERO);
        assert_eq!(parsed[2].end_hash, Some(stream.running_hash()));

        for file in &files {
            let signature = read_signature_file(&file.with_extension(SIGNATURE_FILE_EXTENSION)).unwrap();
            let file_hash = Hash::digest(&fs::read(file).unwrap());
            assert_eq!(signature.file_hash, file_hash);
            assert_eq!(signature.signature, DigestSigner.sign(&file_hash).unwrap());
        }
    }

    #[test]
    fn test_restart_continues_the_chain() {
        let rounds = rounds(4, 1000);
        let (before, after) = rounds.split_at(2);

        let first = ConsensusEventStream::start(
            EventStreamConfig::default(),
            Hash::ZERO,
            ports(Arc::new(InMemoryMetrics::new())),
        )
        .unwrap();
        for round in before {
            first.add_events(round).unwrap();
        }
        first.shutdown().unwrap();
        let saved = first.running_hash();

        // State load after restart: seed from the saved state
        let second = ConsensusEventStream::start(
            EventStreamConfig::default(),
            Hash::ZERO,
            ports(Arc::new(InMemoryMetrics::new())),
        )
        .unwrap();
        second
            .legacy_hash_override(RunningHashUpdate::new(saved, false))
            .unwrap();
        for round in after {
            second.add_events(round).unwrap();
        }
        second.flush().unwrap();

        assert_eq!(second.running_hash(), fold(Hash::ZERO, &rounds.concat()));
        second.shutdown().unwrap();
    }

    #[test]
    fn test_reconnect_skips_the_partial_period() {
        let dir = tempfile::tempdir().unwrap();
        let config = EventStreamConfig {
            log_period_ms: 1000,
            ..EventStreamConfig::persisting_to(dir.path())
        };
        let stream =
            ConsensusEventStream::start(config, Hash::ZERO, ports(Arc::new(InMemoryMetrics::new())))
                .unwrap();

        // Rounds land at 1000ms, 2000ms, ... one period each
        let rounds = rounds(4, 1000);
        stream.add_events(&rounds[0]).unwrap();

        let reconnect_state = Hash::digest(b"state from peer");
        stream
            .legacy_hash_override(RunningHashUpdate::new(reconnect_state, true))
            .unwrap();
        for round in &rounds[2..] {
            stream.add_events(round).unwrap();
        }
        stream.shutdown().unwrap();

        // Round 1 before the reconnect, round 3 skipped, round 4 written
        let files = stream_files(dir.path());
        assert_eq!(files.len(), 2);
        let resumed = read_stream_file(&files[1]).unwrap();
        assert_eq!(resumed.events.len(), 4);
        assert_eq!(resumed.start_hash, fold(reconnect_state, &rounds[2]));
        assert_eq!(
            stream.running_hash(),
            fold(reconnect_state, &rounds[2..].concat())
        );
    }

    #[test]
    fn test_failing_stage_takes_the_stream_down() {
        let dir = tempfile::tempdir().unwrap();
        let ports = ports(Arc::new(InMemoryMetrics::new()))
            .with_serializer(Arc::new(PanickingSerializer));
        let stream = ConsensusEventStream::start(
            EventStreamConfig::persisting_to(dir.path()),
            Hash::ZERO,
            ports,
        )
        .unwrap();

        // The batch is queued; the write stage dies on the first event
        let rounds = rounds(1, 1000);
        let _ = stream.add_events(&rounds[0]);

        assert!(matches!(
            stream.flush(),
            Err(StreamError::StageTerminated { .. })
        ));
        assert!(matches!(stream.shutdown(), Err(StreamError::Worker(_))));
    }
}
