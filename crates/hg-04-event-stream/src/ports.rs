//! Outbound ports of the persistence stage.

use crate::error::{Result, StreamError};
use shared_types::{Hash, PlatformEvent};

/// Turns an event into the bytes stored in a stream file.
pub trait EventSerializer: Send + Sync {
    fn serialize(&self, event: &PlatformEvent) -> Result<Vec<u8>>;
}

/// Signs the SHA-384 of a completed stream file.
pub trait StreamSigner: Send + Sync {
    fn sign(&self, file_hash: &Hash) -> Result<Vec<u8>>;
}

/// `bincode` encoding of `PlatformEvent`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeEventSerializer;

impl EventSerializer for BincodeEventSerializer {
    fn serialize(&self, event: &PlatformEvent) -> Result<Vec<u8>> {
        bincode::serialize(event).map_err(|e| StreamError::Serialization(e.to_string()))
    }
}
