//! # Consensus Event Stream
//!
//! **Crate ID:** hg-04
//!
//! ## Purpose
//!
//! Commits to the consensus order. Every finalized event's hash is folded
//! into a running hash, and (when streaming is enabled) the events are
//! written to signed, period-rotated stream files.
//!
//! ## Components
//!
//! | Type | Role |
//! |------|------|
//! | `ConsensusEventStream` | Intake; fans batches out to the stage queues, honors the freeze latch |
//! | `RunningHash` | `SHA-384(previous || event_hash)` fold |
//! | `EventStreamWriter` | File rotation, headers/footers, signature files |
//! | `EventSerializer` / `StreamSigner` | Outbound ports of the write stage |
//!
//! ## Guarantees
//!
//! - Each stage sees events in `add_events` order.
//! - `legacy_hash_override` is applied after every event queued before it
//!   and before any event queued after it.
//! - Write failures are logged and counted. They never stop hashing.
//!
//! ## Metrics
//!
//! | Name | Kind |
//! |------|------|
//! | `hg_event_stream_events_hashed_total` | counter |
//! | `hg_event_stream_events_written_total` | counter |
//! | `hg_event_stream_write_failures_total` | counter |
//! | `hg_event_stream_files_completed_total` | counter |
//! | `hg_event_stream_events_dropped_total` | counter |

pub mod config;
pub mod error;
pub mod ports;
pub mod running_hash;
mod stages;
pub mod stream;
pub mod writer;

pub use config::EventStreamConfig;
pub use error::{Result, StreamError};
pub use ports::{BincodeEventSerializer, EventSerializer, StreamSigner};
pub use running_hash::{RunningHash, RunningHashUpdate};
pub use stages::METRIC_EVENTS_HASHED;
pub use stream::{ConsensusEventStream, FreezePredicate, StreamPorts, METRIC_EVENTS_DROPPED};
pub use writer::{
    read_signature_file, read_stream_file, stream_file_name, EventStreamWriter, SignatureFile,
    StreamFile, METRIC_EVENTS_WRITTEN, METRIC_FILES_COMPLETED, METRIC_WRITE_FAILURES,
    SIGNATURE_FILE_EXTENSION, STREAM_FILE_EXTENSION, STREAM_FILE_VERSION,
};
