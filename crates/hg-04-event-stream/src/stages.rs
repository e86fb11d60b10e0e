//! Stage workers.
//!
//! Each stage is a loop over a bounded queue, run as one task of the stream's
//! work group. A stage exits on `Close`, on queue disconnect, or when the
//! group is aborted.

use crate::running_hash::{RunningHash, RunningHashUpdate};
use crate::writer::EventStreamWriter;
use crossbeam_channel::{select, Receiver, Sender};
use hg_telemetry::MetricsSink;
use parking_lot::RwLock;
use shared_concurrency::{CancellationToken, Interrupted};
use shared_types::{Hash, PlatformEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub const METRIC_EVENTS_HASHED: &str = "hg_event_stream_events_hashed_total";

/// Messages accepted by both stages.
#[derive(Debug)]
pub(crate) enum StageMessage {
    Event(Arc<PlatformEvent>),
    /// Acknowledged once every earlier message was processed.
    Barrier(Sender<()>),
    SetRunningHash {
        update: RunningHashUpdate,
        ack: Sender<()>,
    },
    Close,
}

/// Receive the next message, or `None` on disconnect.
fn next(
    rx: &Receiver<StageMessage>,
    token: &CancellationToken,
) -> Result<Option<StageMessage>, Interrupted> {
    select! {
        recv(rx) -> message => Ok(message.ok()),
        recv(token.receiver()) -> _ => Err(Interrupted),
    }
}

/// Values the hashing stage publishes to the stream handle.
#[derive(Debug, Clone)]
pub(crate) struct HashOutputs {
    pub running_hash: Arc<RwLock<Hash>>,
    pub events_hashed: Arc<AtomicU64>,
}

impl HashOutputs {
    pub fn new(seed: Hash) -> Self {
        Self {
            running_hash: Arc::new(RwLock::new(seed)),
            events_hashed: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Fold every event into the running hash, in arrival order.
pub(crate) fn run_hash_stage(
    rx: Receiver<StageMessage>,
    seed: Hash,
    outputs: HashOutputs,
    metrics: Arc<dyn MetricsSink>,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    let mut running_hash = RunningHash::new(seed);
    debug!(seed = %seed, "[hg-04] Hash stage started");

    while let Some(message) = next(&rx, token)? {
        match message {
            StageMessage::Event(event) => {
                let value = running_hash.add(&event.hash());
                *outputs.running_hash.write() = value;
                outputs.events_hashed.fetch_add(1, Ordering::SeqCst);
                metrics.increment_counter(METRIC_EVENTS_HASHED, 1);
            }
            StageMessage::Barrier(ack) => {
                let _ = ack.send(());
            }
            StageMessage::SetRunningHash { update, ack } => {
                running_hash.reset(update.running_hash);
                *outputs.running_hash.write() = update.running_hash;
                let _ = ack.send(());
            }
            StageMessage::Close => break,
        }
    }

    info!(
        running_hash = %running_hash.value(),
        "[hg-04] Hash stage stopped"
    );
    Ok(())
}

/// Persist every event through `writer`, in arrival order.
pub(crate) fn run_write_stage(
    rx: Receiver<StageMessage>,
    mut writer: EventStreamWriter,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    debug!("[hg-04] Write stage started");

    while let Some(message) = next(&rx, token)? {
        match message {
            StageMessage::Event(event) => writer.write_event(&event),
            StageMessage::Barrier(ack) => {
                writer.flush();
                let _ = ack.send(());
            }
            StageMessage::SetRunningHash { update, ack } => {
                writer.set_running_hash(update);
                let _ = ack.send(());
            }
            StageMessage::Close => break,
        }
    }

    writer.close();
    info!("[hg-04] Write stage stopped");
    Ok(())
}
