//! # Roster
//!
//! The consensus roster for one epoch: every node's stake weight, plus a dense
//! slot index used by per-node tracking tables.
//!
//! Entries are sorted by `NodeId` at construction, so slot `i` always refers to
//! the `i`-th smallest id. Slot lookup is a binary search over the sorted
//! entries and never allocates.

use crate::entities::NodeId;
use crate::errors::RosterError;
use serde::{Deserialize, Serialize};

/// One node's stake in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub node_id: NodeId,
    pub weight: u64,
}

impl RosterEntry {
    pub fn new(node_id: NodeId, weight: u64) -> Self {
        Self { node_id, weight }
    }
}

/// Immutable per-epoch roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    total_weight: u64,
}

impl Roster {
    /// Build a roster from unordered entries.
    ///
    /// # Errors
    /// - `Empty` if `entries` is empty
    /// - `DuplicateNode` if a node id appears twice
    /// - `WeightOverflow` if the total weight does not fit in a `u64`
    pub fn new(mut entries: Vec<RosterEntry>) -> Result<Self, RosterError> {
        if entries.is_empty() {
            return Err(RosterError::Empty);
        }
        entries.sort_by_key(|e| e.node_id);

        if let Some(pair) = entries.windows(2).find(|w| w[0].node_id == w[1].node_id) {
            return Err(RosterError::DuplicateNode(pair[0].node_id));
        }

        let total_weight = entries
            .iter()
            .try_fold(0u64, |acc, e| acc.checked_add(e.weight))
            .ok_or(RosterError::WeightOverflow)?;

        Ok(Self {
            entries,
            total_weight,
        })
    }

    /// Convenience constructor for `(id, weight)` pairs.
    pub fn from_weights<I>(weights: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        Self::new(
            weights
                .into_iter()
                .map(|(id, weight)| RosterEntry::new(NodeId(id), weight))
                .collect(),
        )
    }

    /// Number of nodes (and therefore slots).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights, computed once at construction.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Dense slot for `node_id`, if it is in the roster.
    pub fn slot_of(&self, node_id: NodeId) -> Option<usize> {
        self.entries
            .binary_search_by_key(&node_id, |e| e.node_id)
            .ok()
    }

    /// Node occupying `slot`.
    pub fn node_at(&self, slot: usize) -> Option<NodeId> {
        self.entries.get(slot).map(|e| e.node_id)
    }

    /// Weight of the node in `slot`, zero for an unknown slot.
    pub fn weight_at(&self, slot: usize) -> u64 {
        self.entries.get(slot).map(|e| e.weight).unwrap_or(0)
    }

    /// Weight of `node_id`, zero if it is not in the roster.
    pub fn weight_of(&self, node_id: NodeId) -> u64 {
        self.slot_of(node_id).map(|s| self.weight_at(s)).unwrap_or(0)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.slot_of(node_id).is_some()
    }

    /// Entries in ascending `NodeId` order.
    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }
}
