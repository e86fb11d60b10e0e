//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `NodeId`
//! - **Hashing**: `Hash` (48-byte SHA-384 digest)
//! - **Events**: `EventDescriptor`, `PlatformEvent`, `ConsensusData`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha384};
use std::fmt;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Unique identifier for a consensus node.
///
/// Ordered so that maps and rosters keyed by `NodeId` iterate deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// =============================================================================
// CLUSTER B: HASHING
// =============================================================================

/// Length in bytes of every digest in the system.
pub const HASH_LENGTH: usize = 48;

/// A 48-byte SHA-384 digest.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(#[serde_as(as = "Bytes")] pub [u8; HASH_LENGTH]);

impl Hash {
    /// The all-zero digest, used as the seed of a fresh running hash.
    pub const ZERO: Hash = Hash([0u8; HASH_LENGTH]);

    /// SHA-384 of `data`.
    pub fn digest(data: &[u8]) -> Self {
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(&Sha384::digest(data));
        Self(out)
    }

    /// Borrow the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Returns true for the all-zero digest.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LENGTH]
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::ZERO
    }
}

// Logs only need enough of the digest to correlate lines.
impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..6]))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

// =============================================================================
// CLUSTER C: EVENTS
// =============================================================================

/// Identifies an event without carrying its payload.
///
/// This is all that branch tracking keeps once an event has been classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventDescriptor {
    /// Content hash of the event.
    pub hash: Hash,
    /// The node that created the event.
    pub creator: NodeId,
    /// Round in which the event was created.
    pub birth_round: u64,
    /// Generation of the event (one more than the max generation of its parents).
    pub generation: u64,
}

impl EventDescriptor {
    pub fn new(hash: Hash, creator: NodeId, birth_round: u64, generation: u64) -> Self {
        Self {
            hash,
            creator,
            birth_round,
            generation,
        }
    }
}

impl fmt::Display for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, g{}, r{}, {})",
            self.creator, self.generation, self.birth_round, self.hash
        )
    }
}

/// Consensus metadata assigned once an event reaches consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusData {
    /// The round in which the event reached consensus.
    pub round: u64,
    /// Position of the event in the total consensus order.
    pub consensus_order: u64,
    /// Consensus timestamp in milliseconds since the UNIX epoch.
    pub consensus_timestamp_ms: u64,
}

/// A gossiped event as seen by this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// This event's own descriptor.
    pub descriptor: EventDescriptor,
    /// The creator's previous event, if any.
    pub self_parent: Option<EventDescriptor>,
    /// Creation time claimed by the creator (ms since UNIX epoch).
    pub time_created_ms: u64,
    /// Opaque transaction payloads carried by the event.
    pub transactions: Vec<Vec<u8>>,
    /// Set once the event has reached consensus.
    pub consensus: Option<ConsensusData>,
}

impl PlatformEvent {
    pub fn new(
        descriptor: EventDescriptor,
        self_parent: Option<EventDescriptor>,
        time_created_ms: u64,
    ) -> Self {
        Self {
            descriptor,
            self_parent,
            time_created_ms,
            transactions: Vec::new(),
            consensus: None,
        }
    }

    /// Attach transaction payloads.
    pub fn with_transactions(mut self, transactions: Vec<Vec<u8>>) -> Self {
        self.transactions = transactions;
        self
    }

    /// Attach consensus metadata.
    pub fn with_consensus(mut self, consensus: ConsensusData) -> Self {
        self.consensus = Some(consensus);
        self
    }

    pub fn creator(&self) -> NodeId {
        self.descriptor.creator
    }

    pub fn hash(&self) -> Hash {
        self.descriptor.hash
    }

    /// Consensus timestamp, falling back to the creation time for events that
    /// have not reached consensus.
    pub fn consensus_timestamp_ms(&self) -> u64 {
        self.consensus
            .map(|c| c.consensus_timestamp_ms)
            .unwrap_or(self.time_created_ms)
    }
}
