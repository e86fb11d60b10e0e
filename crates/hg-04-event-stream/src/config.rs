//! Event stream configuration.

use crate::error::{Result, StreamError};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Event stream settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventStreamConfig {
    /// Run the persistence stage. Hashing always runs.
    pub enable_event_streaming: bool,
    /// Directory receiving `.evts` and `.evts_sig` files.
    pub event_stream_dir: PathBuf,
    /// Length of one file's consensus time span.
    pub log_period_ms: u64,
    /// Capacity of each stage queue. A full queue blocks `add_events`.
    pub queue_capacity: usize,
    /// At most one "dropped after freeze" warning per period.
    pub dropped_event_log_period_ms: u64,
}

impl Default for EventStreamConfig {
    fn default() -> Self {
        Self {
            enable_event_streaming: false,
            event_stream_dir: PathBuf::from("data/eventStreams"),
            log_period_ms: 5000,
            queue_capacity: 500,
            dropped_event_log_period_ms: 60_000,
        }
    }
}

impl EventStreamConfig {
    /// Persisting config rooted at `dir`.
    pub fn persisting_to(dir: impl Into<PathBuf>) -> Self {
        Self {
            enable_event_streaming: true,
            event_stream_dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn dropped_event_log_period(&self) -> Duration {
        Duration::from_millis(self.dropped_event_log_period_ms)
    }

    /// # Errors
    /// `InvalidConfig` for a zero queue capacity or log period.
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(StreamError::InvalidConfig(
                "queue_capacity must be greater than zero".into(),
            ));
        }
        if self.log_period_ms == 0 {
            return Err(StreamError::InvalidConfig(
                "log_period_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
