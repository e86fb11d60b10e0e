//! Transaction pool error types.
//!
//! Submission outcomes are plain `bool`s; errors only describe a pool that
//! cannot be built.

use thiserror::Error;

/// Transaction pool error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionPoolError {
    /// A size limit was configured as zero.
    #[error("configuration value '{field}' must be greater than zero")]
    ZeroLimit { field: &'static str },

    /// A single transaction could never fit into an event.
    #[error(
        "maximum_transaction_size ({transaction}) exceeds max_transaction_bytes_per_event ({event})"
    )]
    TransactionLargerThanEvent { transaction: usize, event: usize },
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, TransactionPoolError>;
