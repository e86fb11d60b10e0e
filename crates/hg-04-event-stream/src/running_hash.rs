//! The running hash chain.
//!
//! `next = SHA-384(previous || event_hash)`, starting from a seed that is
//! either zero or the value loaded from a saved state.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha384};
use shared_types::{Hash, HASH_LENGTH};

/// A running hash seed pushed on state load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningHashUpdate {
    /// The new seed.
    pub running_hash: Hash,
    /// Loaded through a reconnect. The persistence stage then waits for the
    /// next full file period before writing again.
    pub is_reconnect: bool,
}

impl RunningHashUpdate {
    pub fn new(running_hash: Hash, is_reconnect: bool) -> Self {
        Self {
            running_hash,
            is_reconnect,
        }
    }
}

/// Fold of event hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunningHash {
    value: Hash,
}

impl RunningHash {
    pub fn new(seed: Hash) -> Self {
        Self { value: seed }
    }

    /// Fold one event hash into the chain.
    pub fn add(&mut self, event_hash: &Hash) -> Hash {
        self.value = Self::combine(&self.value, event_hash);
        self.value
    }

    pub fn value(&self) -> Hash {
        self.value
    }

    /// Replace the chain value.
    pub fn reset(&mut self, seed: Hash) {
        self.value = seed;
    }

    pub fn combine(previous: &Hash, event_hash: &Hash) -> Hash {
        let mut hasher = Sha384::new();
        hasher.update(previous.as_bytes());
        hasher.update(event_hash.as_bytes());
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(&hasher.finalize());
        Hash(out)
    }
}
