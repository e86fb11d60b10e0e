//! # Consensus Event Stream
//!
//! Fans each batch of consensus events out to two bounded stage queues:
//!
//! ```text
//!                    ┌──────────────┐     ┌────────────┐
//!              ┌───▶ │ hash queue   │ ──▶ │ hash stage │ ──▶ running hash
//! add_events ──┤     └──────────────┘     └────────────┘
//!              │     ┌──────────────┐     ┌─────────────┐
//!              └───▶ │ write queue  │ ──▶ │ write stage │ ──▶ .evts / .evts_sig
//!                    └──────────────┘     └─────────────┘
//! ```
//!
//! A full queue blocks `add_events`. The write stage only exists when
//! streaming is enabled. Both stages run on one `StandardWorkGroup`, so a
//! failure in either stops both.
//!
//! Passing the freeze event closes both stages for good: the freeze event is
//! still processed, everything after it is dropped.

use crate::config::EventStreamConfig;
use crate::error::{Result, StreamError};
use crate::ports::{BincodeEventSerializer, EventSerializer, StreamSigner};
use crate::running_hash::RunningHashUpdate;
use crate::stages::{run_hash_stage, run_write_stage, HashOutputs, StageMessage};
use crate::writer::EventStreamWriter;
use crossbeam_channel::{bounded, select, Sender};
use hg_telemetry::{MetricsSink, RateLimitedLogger};
use parking_lot::Mutex;
use shared_concurrency::{ParallelExecutor, StandardWorkGroup};
use shared_types::{Clock, Hash, PlatformEvent};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub const METRIC_EVENTS_DROPPED: &str = "hg_event_stream_events_dropped_total";

const HASH_STAGE: &str = "hash";
const WRITE_STAGE: &str = "write";

/// Recognizes the last event before a freeze.
pub type FreezePredicate = Arc<dyn Fn(&PlatformEvent) -> bool + Send + Sync>;

/// Collaborators of the stream.
#[derive(Clone)]
pub struct StreamPorts {
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<dyn MetricsSink>,
    pub serializer: Arc<dyn EventSerializer>,
    pub signer: Arc<dyn StreamSigner>,
    pub is_freeze_event: FreezePredicate,
}

impl StreamPorts {
    /// Bincode serialization, no freeze event.
    pub fn new(
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn MetricsSink>,
        signer: Arc<dyn StreamSigner>,
    ) -> Self {
        Self {
            clock,
            metrics,
            serializer: Arc::new(BincodeEventSerializer),
            signer,
            is_freeze_event: Arc::new(|_: &PlatformEvent| false),
        }
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn EventSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_freeze_predicate(
        mut self,
        predicate: impl Fn(&PlatformEvent) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_freeze_event = Arc::new(predicate);
        self
    }
}

enum Intake {
    Open {
        hash_tx: Sender<StageMessage>,
        write_tx: Option<Sender<StageMessage>>,
    },
    /// The freeze event went through; stages were told to close.
    Frozen,
    Closed,
}

struct IntakeState {
    intake: Intake,
    dropped_log: RateLimitedLogger,
}

type Senders = (Sender<StageMessage>, Option<Sender<StageMessage>>);

/// Running-hash pipeline over consensus-ordered events.
pub struct ConsensusEventStream {
    // Declared before `work_group`: dropping the senders lets the stages exit
    // before the group joins them.
    intake: Mutex<IntakeState>,
    outputs: HashOutputs,
    executor: ParallelExecutor,
    work_group: StandardWorkGroup,
    is_freeze_event: FreezePredicate,
    metrics: Arc<dyn MetricsSink>,
}

impl ConsensusEventStream {
    /// Start the stage workers.
    ///
    /// # Errors
    /// `InvalidConfig`, `Io` if the stream directory cannot be created, or
    /// `Worker` if the stage threads cannot be started.
    pub fn start(
        config: EventStreamConfig,
        initial_running_hash: Hash,
        ports: StreamPorts,
    ) -> Result<Self> {
        config.validate()?;
        let persisting = config.enable_event_streaming;
        if persisting {
            fs::create_dir_all(&config.event_stream_dir)
                .map_err(|e| StreamError::io(&config.event_stream_dir, e))?;
        }

        let worker = |e: shared_concurrency::WorkGroupError| StreamError::Worker(e.to_string());
        let work_group =
            StandardWorkGroup::new("event-stream", if persisting { 2 } else { 1 }).map_err(worker)?;
        let outputs = HashOutputs::new(initial_running_hash);

        let (hash_tx, hash_rx) = bounded(config.queue_capacity);
        {
            let outputs = outputs.clone();
            let metrics = Arc::clone(&ports.metrics);
            work_group
                .execute(move |token| {
                    run_hash_stage(hash_rx, initial_running_hash, outputs, metrics, token)
                })
                .map_err(worker)?;
        }

        let write_tx = if persisting {
            let (write_tx, write_rx) = bounded(config.queue_capacity);
            let writer = EventStreamWriter::new(
                &config,
                initial_running_hash,
                Arc::clone(&ports.serializer),
                Arc::clone(&ports.signer),
                Arc::clone(&ports.metrics),
            );
            work_group
                .execute(move |token| run_write_stage(write_rx, writer, token))
                .map_err(worker)?;
            Some(write_tx)
        } else {
            None
        };

        info!(
            persisting,
            dir = %config.event_stream_dir.display(),
            running_hash = %initial_running_hash,
            "[hg-04] Consensus event stream started"
        );

        Ok(Self {
            intake: Mutex::new(IntakeState {
                intake: Intake::Open { hash_tx, write_tx },
                dropped_log: RateLimitedLogger::new(
                    ports.clock,
                    config.dropped_event_log_period(),
                ),
            }),
            outputs,
            executor: ParallelExecutor::new("event-stream-intake"),
            work_group,
            is_freeze_event: ports.is_freeze_event,
            metrics: ports.metrics,
        })
    }

    /// Queue `events`, in order, on every stage.
    ///
    /// Blocks while a stage queue is full. After the freeze event, events are
    /// dropped and `Ok` is returned.
    ///
    /// # Errors
    /// `Closed` after `shutdown()`, `StageTerminated` if a stage is gone.
    pub fn add_events(&self, events: &[Arc<PlatformEvent>]) -> Result<()> {
        let mut state = self.intake.lock();
        let Some((hash_tx, write_tx)) = Self::senders(&state.intake)? else {
            self.record_dropped(&mut state.dropped_log, events.len());
            return Ok(());
        };

        let freeze_at = events.iter().position(|event| (self.is_freeze_event)(event));
        let (accepted, dropped) = match freeze_at {
            Some(index) => events.split_at(index + 1),
            None => (events, &[][..]),
        };

        self.dispatch(accepted, &hash_tx, write_tx.as_ref())?;

        if freeze_at.is_some() {
            let _ = hash_tx.send(StageMessage::Close);
            if let Some(write_tx) = &write_tx {
                let _ = write_tx.send(StageMessage::Close);
            }
            state.intake = Intake::Frozen;
            info!("[hg-04] Freeze event reached; event stream closed");
            if !dropped.is_empty() {
                self.record_dropped(&mut state.dropped_log, dropped.len());
            }
        }
        Ok(())
    }

    /// Replace the running hash after a state load.
    ///
    /// Intake stays locked until every stage has processed everything queued
    /// before the update and applied it, so no event is hashed against the
    /// wrong seed. Once frozen or shut down, the stages are joined first and
    /// the seed is stored afterwards.
    ///
    /// # Errors
    /// `StageTerminated` if a stage exits before applying the update, `Worker`
    /// if a stage failed.
    pub fn legacy_hash_override(&self, update: RunningHashUpdate) -> Result<()> {
        let state = self.intake.lock();
        let Intake::Open { hash_tx, write_tx } = &state.intake else {
            self.join_stages()?;
            *self.outputs.running_hash.write() = update.running_hash;
            info!(
                running_hash = %update.running_hash,
                "[hg-04] Running hash overridden on a closed stream"
            );
            return Ok(());
        };

        self.round_trip(hash_tx, write_tx.as_ref(), |ack| StageMessage::SetRunningHash {
            update,
            ack,
        })?;
        info!(
            running_hash = %update.running_hash,
            reconnect = update.is_reconnect,
            "[hg-04] Running hash overridden"
        );
        Ok(())
    }

    /// Return once every stage has processed everything queued so far.
    ///
    /// After the freeze event this waits for the stages to finish.
    ///
    /// # Errors
    /// `StageTerminated` if a stage is gone, `Worker` if a stage failed.
    pub fn flush(&self) -> Result<()> {
        let state = self.intake.lock();
        match &state.intake {
            Intake::Open { hash_tx, write_tx } => {
                self.round_trip(hash_tx, write_tx.as_ref(), StageMessage::Barrier)
            }
            Intake::Frozen => self.join_stages(),
            Intake::Closed => Ok(()),
        }
    }

    /// Close both stages and wait for them to exit. Idempotent.
    ///
    /// # Errors
    /// `Worker` if a stage failed.
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.intake.lock();
        let previous = std::mem::replace(&mut state.intake, Intake::Closed);
        drop(state);

        match previous {
            Intake::Open { hash_tx, write_tx } => {
                let _ = hash_tx.send(StageMessage::Close);
                if let Some(write_tx) = write_tx {
                    let _ = write_tx.send(StageMessage::Close);
                }
            }
            Intake::Frozen => {}
            Intake::Closed => return Ok(()),
        }
        let joined = self.join_stages();
        info!(running_hash = %self.running_hash(), "[hg-04] Consensus event stream shut down");
        joined
    }

    /// Running hash after the last event the hash stage processed.
    pub fn running_hash(&self) -> Hash {
        *self.outputs.running_hash.read()
    }

    /// Events folded into the running hash since start.
    pub fn events_hashed(&self) -> u64 {
        self.outputs.events_hashed.load(Ordering::SeqCst)
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.intake.lock().intake, Intake::Frozen)
    }

    fn senders(intake: &Intake) -> Result<Option<Senders>> {
        match intake {
            Intake::Open { hash_tx, write_tx } => Ok(Some((hash_tx.clone(), write_tx.clone()))),
            Intake::Frozen => Ok(None),
            Intake::Closed => Err(StreamError::Closed),
        }
    }

    fn dispatch(
        &self,
        events: &[Arc<PlatformEvent>],
        hash_tx: &Sender<StageMessage>,
        write_tx: Option<&Sender<StageMessage>>,
    ) -> Result<()> {
        let aborted = AtomicBool::new(false);
        let Some(write_tx) = write_tx else {
            return feed(events, hash_tx, &aborted, HASH_STAGE);
        };

        self.executor
            .do_parallel(
                || feed(events, hash_tx, &aborted, HASH_STAGE).map_err(anyhow::Error::from),
                || feed(events, write_tx, &aborted, WRITE_STAGE).map_err(anyhow::Error::from),
                || aborted.store(true, Ordering::SeqCst),
            )
            .map(|_| ())
            .map_err(|e| match e.cause.downcast::<StreamError>() {
                Ok(error) => error,
                Err(other) => StreamError::Worker(other.to_string()),
            })
    }

    /// Send one acknowledged message per stage and wait for every ack.
    fn round_trip(
        &self,
        hash_tx: &Sender<StageMessage>,
        write_tx: Option<&Sender<StageMessage>>,
        message: impl Fn(Sender<()>) -> StageMessage,
    ) -> Result<()> {
        let stages = std::iter::once((HASH_STAGE, hash_tx))
            .chain(write_tx.map(|tx| (WRITE_STAGE, tx)));

        let mut pending = Vec::with_capacity(2);
        for (stage, tx) in stages {
            let (ack_tx, ack_rx) = bounded(1);
            tx.send(message(ack_tx))
                .map_err(|_| StreamError::StageTerminated { stage })?;
            pending.push((stage, ack_rx));
        }

        let token = self.work_group.cancellation_token();
        for (stage, ack) in pending {
            select! {
                recv(ack) -> acked => acked.map_err(|_| StreamError::StageTerminated { stage })?,
                recv(token.receiver()) -> _ => return Err(StreamError::StageTerminated { stage }),
            }
        }
        Ok(())
    }

    fn join_stages(&self) -> Result<()> {
        self.work_group
            .wait_for_termination()
            .map_err(|e| StreamError::Worker(e.to_string()))
    }

    fn record_dropped(&self, log: &mut RateLimitedLogger, count: usize) {
        if count == 0 {
            return;
        }
        self.metrics
            .increment_counter(METRIC_EVENTS_DROPPED, count as u64);
        if let Some(suppressed) = log.admit() {
            warn!(
                dropped = count,
                suppressed,
                "[hg-04] Dropping events received after the freeze event"
            );
        }
    }
}

impl std::fmt::Debug for ConsensusEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusEventStream")
            .field("running_hash", &self.running_hash())
            .field("events_hashed", &self.events_hashed())
            .field("work_group", &self.work_group)
            .finish()
    }
}

fn feed(
    events: &[Arc<PlatformEvent>],
    tx: &Sender<StageMessage>,
    aborted: &AtomicBool,
    stage: &'static str,
) -> Result<()> {
    for event in events {
        if aborted.load(Ordering::SeqCst) {
            break;
        }
        tx.send(StageMessage::Event(Arc::clone(event)))
            .map_err(|_| StreamError::StageTerminated { stage })?;
    }
    Ok(())
}
