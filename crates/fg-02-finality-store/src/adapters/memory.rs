//! In-memory finality store for unit tests.

use crate::adapters::transaction::{StagedTransaction, StoreBackend};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::write_set::{merge_block, settled_activation, WriteSet};
use crate::ports::inbound::FinalityStore;
use parking_lot::RwLock;
use shared_types::{Block, BtcDelegation, EventKey, EventRecord, FinalityProvider};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct MemoryState {
    blocks: BTreeMap<u64, Block>,
    hash_index: HashMap<String, u64>,
    providers: HashMap<String, FinalityProvider>,
    delegations: HashMap<String, BtcDelegation>,
    events: BTreeMap<EventKey, EventRecord>,
    activated: Option<u64>,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    closed: AtomicBool,
}

impl StoreBackend for MemoryBackend {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::closed());
        }
        Ok(())
    }

    fn block_by_height(&self, height: u64) -> StoreResult<Option<Block>> {
        Ok(self.state.read().blocks.get(&height).cloned())
    }

    fn block_height_by_hash(&self, hash: &str) -> StoreResult<Option<u64>> {
        Ok(self.state.read().hash_index.get(hash).copied())
    }

    fn latest_finalized_block(&self) -> StoreResult<Option<Block>> {
        let state = self.state.read();
        Ok(state.blocks.values().rev().find(|b| b.finalized).cloned())
    }

    fn finality_provider(&self, btc_pk_hex: &str) -> StoreResult<Option<FinalityProvider>> {
        Ok(self.state.read().providers.get(btc_pk_hex).cloned())
    }

    fn delegation(&self, staking_tx_hash_hex: &str) -> StoreResult<Option<BtcDelegation>> {
        Ok(self.state.read().delegations.get(staking_tx_hash_hex).cloned())
    }

    fn event_recorded(&self, key: &EventKey) -> StoreResult<bool> {
        Ok(self.state.read().events.contains_key(key))
    }

    fn activated_timestamp(&self) -> StoreResult<Option<u64>> {
        Ok(self.state.read().activated)
    }

    fn apply(&self, writes: WriteSet) -> StoreResult<()> {
        let mut state = self.state.write();
        self.ensure_open()?;

        if let Some(key) = writes.events.keys().find(|k| state.events.contains_key(*k)) {
            return Err(StoreError::Conflict {
                key: key.to_string(),
            });
        }

        for (height, block) in writes.blocks {
            let Some(block) = merge_block(state.blocks.get(&height), block) else {
                continue;
            };
            let replaced_hash = state
                .blocks
                .get(&height)
                .filter(|old| old.hash != block.hash)
                .map(|old| old.hash.clone());
            if let Some(old_hash) = replaced_hash {
                state.hash_index.remove(&old_hash);
            }
            state.hash_index.insert(block.hash.clone(), height);
            state.blocks.insert(height, block);
        }
        state.providers.extend(writes.providers);
        state.delegations.extend(writes.delegations);
        state.events.extend(writes.events);
        if let Some(timestamp) = writes.activated {
            state.activated = Some(settled_activation(state.activated, timestamp));
        }
        Ok(())
    }
}

/// Map-backed [`FinalityStore`]. Clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryFinalityStore {
    backend: Arc<MemoryBackend>,
}

impl InMemoryFinalityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every applied event, ordered by key.
    pub fn applied_events(&self) -> Vec<EventRecord> {
        self.backend.state.read().events.values().cloned().collect()
    }

    pub fn is_closed(&self) -> bool {
        self.backend.closed.load(Ordering::Acquire)
    }
}

impl FinalityStore for InMemoryFinalityStore {
    type Tx = StagedTransaction<MemoryBackend>;

    fn begin_tx(&self) -> StoreResult<Self::Tx> {
        self.backend.ensure_open()?;
        Ok(StagedTransaction::new(self.backend.clone()))
    }

    fn close(&self) -> StoreResult<()> {
        // Wait out any commit in progress.
        let _state = self.backend.state.write();
        self.backend.closed.store(true, Ordering::Release);
        Ok(())
    }
}
