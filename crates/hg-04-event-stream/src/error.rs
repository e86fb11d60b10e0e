//! Error types for the event stream.

use std::path::PathBuf;
use thiserror::Error;

/// Event stream errors.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The configuration cannot be used.
    #[error("invalid event stream configuration: {0}")]
    InvalidConfig(String),

    /// A stage worker exited while the stream still needed it.
    #[error("{stage} stage terminated")]
    StageTerminated { stage: &'static str },

    /// `shutdown()` was called.
    #[error("event stream is shut down")]
    Closed,

    /// A file operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An event could not be serialized.
    #[error("event serialization failed: {0}")]
    Serialization(String),

    /// The signer refused or failed.
    #[error("stream file signing failed: {0}")]
    Signing(String),

    /// A stream file does not follow the expected layout.
    #[error("malformed stream file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    /// The worker pool failed.
    #[error("event stream worker failed: {0}")]
    Worker(String),
}

impl StreamError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, StreamError>;
