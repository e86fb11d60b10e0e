//! Transaction pool configuration.

use super::errors::{Result, TransactionPoolError};
use serde::Deserialize;
use std::time::Duration;

/// Limits applied by the `TransactionPoolNexus`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransactionPoolConfig {
    /// Largest application transaction accepted, in bytes.
    pub maximum_transaction_size: usize,
    /// Byte budget of one `get_transactions()` call.
    pub max_transaction_bytes_per_event: usize,
    /// Normal submissions are rejected once this many transactions are buffered.
    pub throttle_transaction_queue_size: usize,
    /// Longer continuous unhealthiness than this rejects application transactions.
    pub maximum_permissible_unhealthy_duration_ms: u64,
}

impl Default for TransactionPoolConfig {
    fn default() -> Self {
        Self {
            maximum_transaction_size: 6144,           // 6 KiB
            max_transaction_bytes_per_event: 245_760, // 240 KiB
            throttle_transaction_queue_size: 100_000,
            maximum_permissible_unhealthy_duration_ms: 1000,
        }
    }
}

impl TransactionPoolConfig {
    /// Creates a small config for testing.
    pub fn for_testing() -> Self {
        Self {
            maximum_transaction_size: 64,
            max_transaction_bytes_per_event: 256,
            throttle_transaction_queue_size: 10,
            maximum_permissible_unhealthy_duration_ms: 1000,
        }
    }

    pub fn maximum_permissible_unhealthy_duration(&self) -> Duration {
        Duration::from_millis(self.maximum_permissible_unhealthy_duration_ms)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// `ZeroLimit` for a zero size limit, `TransactionLargerThanEvent` if a
    /// maximum-size transaction could never be packed.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("maximum_transaction_size", self.maximum_transaction_size),
            (
                "max_transaction_bytes_per_event",
                self.max_transaction_bytes_per_event,
            ),
            (
                "throttle_transaction_queue_size",
                self.throttle_transaction_queue_size,
            ),
        ];
        if let Some((field, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(TransactionPoolError::ZeroLimit { field });
        }
        if self.maximum_transaction_size > self.max_transaction_bytes_per_event {
            return Err(TransactionPoolError::TransactionLargerThanEvent {
                transaction: self.maximum_transaction_size,
                event: self.max_transaction_bytes_per_event,
            });
        }
        Ok(())
    }
}
