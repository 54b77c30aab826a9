//! Writes staged by one transaction.
//!
//! A transaction only ever adds to its write set; nothing reaches the
//! backing store until commit hands the whole set over at once.

use shared_types::{Block, BtcDelegation, EventKey, EventRecord, FinalityProvider};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct WriteSet {
    pub blocks: BTreeMap<u64, Block>,
    pub providers: BTreeMap<String, FinalityProvider>,
    pub delegations: BTreeMap<String, BtcDelegation>,
    /// Guarded inserts into the applied-event log
    pub events: BTreeMap<EventKey, EventRecord>,
    /// First activation timestamp staged
    pub activated: Option<u64>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
            && self.providers.is_empty()
            && self.delegations.is_empty()
            && self.events.is_empty()
            && self.activated.is_none()
    }

    /// Stage an activation timestamp; the first one staged stands.
    pub fn stage_activation(&mut self, timestamp: u64) {
        self.activated = Some(settled_activation(self.activated, timestamp));
    }

    /// Highest staged finalized block.
    pub fn latest_finalized(&self) -> Option<&Block> {
        self.blocks.values().rev().find(|block| block.finalized)
    }

    /// Number of rows this set writes.
    pub fn len(&self) -> usize {
        self.blocks.len()
            + self.providers.len()
            + self.delegations.len()
            + self.events.len()
            + usize::from(self.activated.is_some())
    }
}

/// Row to store when `incoming` is written over `existing`.
///
/// `None` means the write is dropped: a finalized block is never replaced by
/// a non-finalized one.
pub fn merge_block(existing: Option<&Block>, incoming: Block) -> Option<Block> {
    match existing {
        Some(current) if current.finalized && !incoming.finalized => None,
        _ => Some(incoming),
    }
}

/// Activation record after writing `timestamp` over `current`.
///
/// The record is written once; later writes never replace it.
pub fn settled_activation(current: Option<u64>, timestamp: u64) -> u64 {
    current.unwrap_or(timestamp)
}
