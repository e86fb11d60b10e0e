//! # Event Stream Writer
//!
//! Persists consensus events into one file per log period.
//!
//! ## File Layout
//!
//! ```text
//! <UTC timestamp of first event>.evts
//!   [version: u32 LE][start running hash: 48 bytes]
//!   ([length: u32 LE][serialized event])*
//!   [0xFFFF_FFFF][end running hash: 48 bytes]
//!
//! <same name>.evts_sig
//!   [version: u32 LE][SHA-384 of the .evts file: 48 bytes][length: u32 LE][signature]
//! ```
//!
//! Write failures never propagate: the broken file is abandoned, the failure
//! is logged and counted, and writing resumes with the next period. The
//! running hash keeps advancing over every event either way.

use crate::config::EventStreamConfig;
use crate::error::{Result, StreamError};
use crate::ports::{EventSerializer, StreamSigner};
use crate::running_hash::{RunningHash, RunningHashUpdate};
use chrono::{DateTime, Utc};
use hg_telemetry::MetricsSink;
use sha2::{Digest, Sha384};
use shared_types::{Hash, PlatformEvent, HASH_LENGTH};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const STREAM_FILE_EXTENSION: &str = "evts";
pub const SIGNATURE_FILE_EXTENSION: &str = "evts_sig";
pub const STREAM_FILE_VERSION: u32 = 1;
const FOOTER_MARKER: u32 = u32::MAX;

pub const METRIC_EVENTS_WRITTEN: &str = "hg_event_stream_events_written_total";
pub const METRIC_WRITE_FAILURES: &str = "hg_event_stream_write_failures_total";
pub const METRIC_FILES_COMPLETED: &str = "hg_event_stream_files_completed_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Writing,
    /// After a reconnect: the next event's period is skipped entirely.
    AwaitingFirstEvent,
    /// Nothing is written until an event from another period arrives.
    SkippingPeriod(u64),
}

struct OpenFile {
    path: PathBuf,
    out: BufWriter<File>,
    period: u64,
    digest: Sha384,
    events: u64,
}

impl OpenFile {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.out
            .write_all(bytes)
            .map_err(|e| StreamError::io(&self.path, e))?;
        self.digest.update(bytes);
        Ok(())
    }
}

/// Writes consensus events into period-rotated, signed stream files.
pub struct EventStreamWriter {
    dir: PathBuf,
    log_period_ms: u64,
    serializer: Arc<dyn EventSerializer>,
    signer: Arc<dyn StreamSigner>,
    metrics: Arc<dyn MetricsSink>,
    running_hash: RunningHash,
    current: Option<OpenFile>,
    mode: WriteMode,
}

impl EventStreamWriter {
    pub fn new(
        config: &EventStreamConfig,
        seed: Hash,
        serializer: Arc<dyn EventSerializer>,
        signer: Arc<dyn StreamSigner>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            dir: config.event_stream_dir.clone(),
            log_period_ms: config.log_period_ms.max(1),
            serializer,
            signer,
            metrics,
            running_hash: RunningHash::new(seed),
            current: None,
            mode: WriteMode::Writing,
        }
    }

    /// Append `event`, rotating files on period boundaries.
    pub fn write_event(&mut self, event: &PlatformEvent) {
        let period = event.consensus_timestamp_ms() / self.log_period_ms;
        if self.current.as_ref().is_some_and(|file| file.period != period) {
            self.close();
        }

        let start_hash = self.running_hash.value();
        self.running_hash.add(&event.hash());

        match self.mode {
            WriteMode::Writing => {}
            WriteMode::AwaitingFirstEvent => {
                debug!(period, "[hg-04] Skipping partial period after reconnect");
                self.mode = WriteMode::SkippingPeriod(period);
                return;
            }
            WriteMode::SkippingPeriod(skipped) if skipped == period => return,
            WriteMode::SkippingPeriod(_) => self.mode = WriteMode::Writing,
        }

        if let Err(e) = self.append(event, period, start_hash) {
            self.abandon(period, &e);
        }
    }

    /// Close the current file and continue the chain from `update`.
    pub fn set_running_hash(&mut self, update: RunningHashUpdate) {
        self.close();
        self.running_hash.reset(update.running_hash);
        if update.is_reconnect {
            self.mode = WriteMode::AwaitingFirstEvent;
        }
        info!(
            running_hash = %update.running_hash,
            reconnect = update.is_reconnect,
            "[hg-04] Writer running hash replaced"
        );
    }

    /// Push buffered bytes to the OS.
    pub fn flush(&mut self) {
        let Some(file) = self.current.as_mut() else {
            return;
        };
        if let Err(e) = file.out.flush() {
            let period = file.period;
            let e = StreamError::io(&file.path, e);
            self.abandon(period, &e);
        }
    }

    /// Finish the current file: footer, sync, signature.
    pub fn close(&mut self) {
        let Some(file) = self.current.take() else {
            return;
        };
        let path = file.path.clone();
        let events = file.events;
        match self.finish(file) {
            Ok(()) => {
                self.metrics.increment_counter(METRIC_FILES_COMPLETED, 1);
                info!(file = %path.display(), events, "[hg-04] Stream file completed");
            }
            Err(e) => {
                self.metrics.increment_counter(METRIC_WRITE_FAILURES, 1);
                error!(file = %path.display(), error = %e, "[hg-04] Failed to complete stream file");
            }
        }
    }

    /// Chain value after the last event seen (written or not).
    pub fn running_hash(&self) -> Hash {
        self.running_hash.value()
    }

    /// Path of the file currently being written.
    pub fn current_file(&self) -> Option<&Path> {
        self.current.as_ref().map(|file| file.path.as_path())
    }

    fn append(&mut self, event: &PlatformEvent, period: u64, start_hash: Hash) -> Result<()> {
        let bytes = self.serializer.serialize(event)?;
        let length = u32::try_from(bytes.len())
            .ok()
            .filter(|length| *length != FOOTER_MARKER)
            .ok_or_else(|| StreamError::Serialization("serialized event too large".into()))?;

        if self.current.is_none() {
            let opened = self.open(event.consensus_timestamp_ms(), period, start_hash)?;
            self.current = Some(opened);
        }
        let Some(file) = self.current.as_mut() else {
            return Ok(());
        };
        file.write_all(&length.to_le_bytes())?;
        file.write_all(&bytes)?;
        file.events += 1;

        self.metrics.increment_counter(METRIC_EVENTS_WRITTEN, 1);
        Ok(())
    }

    fn open(&self, timestamp_ms: u64, period: u64, start_hash: Hash) -> Result<OpenFile> {
        fs::create_dir_all(&self.dir).map_err(|e| StreamError::io(&self.dir, e))?;
        let path = self.dir.join(stream_file_name(timestamp_ms));
        let file = File::create(&path).map_err(|e| StreamError::io(&path, e))?;

        let mut open = OpenFile {
            path,
            out: BufWriter::new(file),
            period,
            digest: Sha384::new(),
            events: 0,
        };
        open.write_all(&STREAM_FILE_VERSION.to_le_bytes())?;
        open.write_all(start_hash.as_bytes())?;

        debug!(file = %open.path.display(), period, "[hg-04] Stream file opened");
        Ok(open)
    }

    fn finish(&self, mut file: OpenFile) -> Result<()> {
        file.write_all(&FOOTER_MARKER.to_le_bytes())?;
        file.write_all(self.running_hash.value().as_bytes())?;
        file.out
            .flush()
            .map_err(|e| StreamError::io(&file.path, e))?;
        file.out
            .get_ref()
            .sync_all()
            .map_err(|e| StreamError::io(&file.path, e))?;

        let mut file_hash = [0u8; HASH_LENGTH];
        file_hash.copy_from_slice(&file.digest.finalize());
        let file_hash = Hash(file_hash);
        let signature = self.signer.sign(&file_hash)?;
        let signature_length = u32::try_from(signature.len())
            .map_err(|_| StreamError::Signing("signature too large".into()))?;

        let mut contents = Vec::with_capacity(4 + HASH_LENGTH + 4 + signature.len());
        contents.extend_from_slice(&STREAM_FILE_VERSION.to_le_bytes());
        contents.extend_from_slice(file_hash.as_bytes());
        contents.extend_from_slice(&signature_length.to_le_bytes());
        contents.extend_from_slice(&signature);

        let signature_path = file.path.with_extension(SIGNATURE_FILE_EXTENSION);
        fs::write(&signature_path, contents).map_err(|e| StreamError::io(&signature_path, e))
    }

    fn abandon(&mut self, period: u64, cause: &StreamError) {
        self.metrics.increment_counter(METRIC_WRITE_FAILURES, 1);
        let file = self.current.take().map(|file| file.path);
        error!(
            error = %cause,
            file = ?file,
            period,
            "[hg-04] Event stream write failed; skipping to the next period"
        );
        self.mode = WriteMode::SkippingPeriod(period);
    }
}

impl Drop for EventStreamWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// `<UTC timestamp>.evts` for a file whose first event has `timestamp_ms`.
pub fn stream_file_name(timestamp_ms: u64) -> String {
    let stamp = i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|time| time.format("%Y-%m-%dT%H_%M_%S%.3fZ").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string());
    format!("{stamp}.{STREAM_FILE_EXTENSION}")
}

// =============================================================================
// Reading
// =============================================================================

/// Decoded contents of a `.evts` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFile {
    pub version: u32,
    pub start_hash: Hash,
    pub events: Vec<Vec<u8>>,
    /// Absent if the file was never completed.
    pub end_hash: Option<Hash>,
}

/// Decoded contents of a `.evts_sig` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFile {
    pub version: u32,
    pub file_hash: Hash,
    pub signature: Vec<u8>,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.at.checked_add(n)?;
        let slice = self.bytes.get(self.at..end)?;
        self.at = end;
        Some(slice)
    }

    fn u32(&mut self) -> Option<u32> {
        self.take(4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
    }

    fn hash(&mut self) -> Option<Hash> {
        self.take(HASH_LENGTH)
            .and_then(|b| b.try_into().ok())
            .map(Hash)
    }

    fn is_empty(&self) -> bool {
        self.at >= self.bytes.len()
    }
}

/// Parse a `.evts` file.
///
/// # Errors
/// `Io` if it cannot be read, `Malformed` if it is truncated or corrupt.
pub fn read_stream_file(path: &Path) -> Result<StreamFile> {
    let bytes = fs::read(path).map_err(|e| StreamError::io(path, e))?;
    let malformed = |reason: &str| StreamError::Malformed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    let mut cursor = Cursor { bytes: &bytes, at: 0 };

    let version = cursor.u32().ok_or_else(|| malformed("missing version"))?;
    let start_hash = cursor.hash().ok_or_else(|| malformed("missing start hash"))?;

    let mut events = Vec::new();
    let mut end_hash = None;
    while !cursor.is_empty() {
        let length = cursor.u32().ok_or_else(|| malformed("truncated length"))?;
        if length == FOOTER_MARKER {
            end_hash = Some(cursor.hash().ok_or_else(|| malformed("truncated footer"))?);
            if !cursor.is_empty() {
                return Err(malformed("data after footer"));
            }
            break;
        }
        let event = cursor
            .take(length as usize)
            .ok_or_else(|| malformed("truncated event"))?;
        events.push(event.to_vec());
    }

    Ok(StreamFile {
        version,
        start_hash,
        events,
        end_hash,
    })
}

/// Parse a `.evts_sig` file.
///
/// # Errors
/// `Io` if it cannot be read, `Malformed` if it is truncated.
pub fn read_signature_file(path: &Path) -> Result<SignatureFile> {
    let bytes = fs::read(path).map_err(|e| StreamError::io(path, e))?;
    let malformed = || StreamError::Malformed {
        path: path.to_path_buf(),
        reason: "truncated signature file".into(),
    };
    let mut cursor = Cursor { bytes: &bytes, at: 0 };

    let version = cursor.u32().ok_or_else(malformed)?;
    let file_hash = cursor.hash().ok_or_else(malformed)?;
    let length = cursor.u32().ok_or_else(malformed)?;
    let signature = cursor.take(length as usize).ok_or_else(malformed)?.to_vec();

    Ok(SignatureFile {
        version,
        file_hash,
        signature,
    })
}
