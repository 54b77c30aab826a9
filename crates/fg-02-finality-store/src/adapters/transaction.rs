//! Staged transactions.
//!
//! A [`StagedTransaction`] buffers writes in a [`WriteSet`] and reads through
//! it to the backend's committed state. On commit the backend validates the
//! guarded inserts and applies the whole set under its write lock.

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::write_set::{merge_block, WriteSet};
use crate::ports::inbound::StoreTransaction;
use shared_types::{Block, BtcDelegation, EventKey, EventRecord, FinalityProvider};
use std::sync::Arc;
use tracing::debug;

/// Committed state of a store, plus the atomic apply step.
pub trait StoreBackend: Send + Sync + 'static {
    /// Fails with [`StoreError::Persistence`] once the store is closed.
    fn ensure_open(&self) -> StoreResult<()>;

    fn block_by_height(&self, height: u64) -> StoreResult<Option<Block>>;

    fn block_height_by_hash(&self, hash: &str) -> StoreResult<Option<u64>>;

    fn latest_finalized_block(&self) -> StoreResult<Option<Block>>;

    fn finality_provider(&self, btc_pk_hex: &str) -> StoreResult<Option<FinalityProvider>>;

    fn delegation(&self, staking_tx_hash_hex: &str) -> StoreResult<Option<BtcDelegation>>;

    fn event_recorded(&self, key: &EventKey) -> StoreResult<bool>;

    fn activated_timestamp(&self) -> StoreResult<Option<u64>>;

    /// Validate and apply `writes` as one unit.
    ///
    /// Under a single write lock: fail with [`StoreError::Conflict`] if any
    /// staged event is already recorded, otherwise write everything. Blocks
    /// merge without downgrading and activation keeps the earliest value.
    fn apply(&self, writes: WriteSet) -> StoreResult<()>;
}

pub struct StagedTransaction<B: StoreBackend> {
    backend: Arc<B>,
    writes: WriteSet,
}

impl<B: StoreBackend> StagedTransaction<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            writes: WriteSet::default(),
        }
    }

    fn backend(&self) -> StoreResult<&B> {
        self.backend.ensure_open()?;
        Ok(&self.backend)
    }
}

impl<B: StoreBackend> StoreTransaction for StagedTransaction<B> {
    fn get_block_by_height(&self, height: u64) -> StoreResult<Option<Block>> {
        if let Some(block) = self.writes.blocks.get(&height) {
            return Ok(Some(block.clone()));
        }
        self.backend()?.block_by_height(height)
    }

    fn get_block_by_hash(&self, hash: &str) -> StoreResult<Option<Block>> {
        if let Some(block) = self.writes.blocks.values().find(|b| b.hash == hash) {
            return Ok(Some(block.clone()));
        }
        let Some(height) = self.backend()?.block_height_by_hash(hash)? else {
            return Ok(None);
        };
        // The height may have been re-staged under another hash.
        Ok(self
            .get_block_by_height(height)?
            .filter(|block| block.hash == hash))
    }

    fn latest_finalized_block(&self) -> StoreResult<Option<Block>> {
        let committed = self.backend()?.latest_finalized_block()?;
        let staged = self.writes.latest_finalized().cloned();
        Ok(match (committed, staged) {
            (Some(committed), Some(staged)) if committed.height > staged.height => Some(committed),
            (committed, None) => committed,
            (_, staged) => staged,
        })
    }

    fn get_finality_provider(&self, btc_pk_hex: &str) -> StoreResult<Option<FinalityProvider>> {
        if let Some(fp) = self.writes.providers.get(btc_pk_hex) {
            return Ok(Some(fp.clone()));
        }
        self.backend()?.finality_provider(btc_pk_hex)
    }

    fn get_delegation(&self, staking_tx_hash_hex: &str) -> StoreResult<Option<BtcDelegation>> {
        if let Some(del) = self.writes.delegations.get(staking_tx_hash_hex) {
            return Ok(Some(del.clone()));
        }
        self.backend()?.delegation(staking_tx_hash_hex)
    }

    fn activated_timestamp(&self) -> StoreResult<Option<u64>> {
        let committed = self.backend()?.activated_timestamp()?;
        Ok(committed.or(self.writes.activated))
    }

    fn event_applied(&self, key: &EventKey) -> StoreResult<bool> {
        if self.writes.events.contains_key(key) {
            return Ok(true);
        }
        self.backend()?.event_recorded(key)
    }

    fn insert_block(&mut self, block: Block) -> StoreResult<()> {
        let existing = self.get_block_by_height(block.height)?;
        if let Some(block) = merge_block(existing.as_ref(), block) {
            self.writes.blocks.insert(block.height, block);
        }
        Ok(())
    }

    fn upsert_finality_provider(&mut self, fp: FinalityProvider) -> StoreResult<()> {
        self.backend()?;
        self.writes.providers.insert(fp.btc_pk_hex.clone(), fp);
        Ok(())
    }

    fn upsert_delegation(&mut self, del: BtcDelegation) -> StoreResult<()> {
        self.backend()?;
        self.writes
            .delegations
            .insert(del.staking_tx_hash_hex.clone(), del);
        Ok(())
    }

    fn save_activated_timestamp(&mut self, timestamp: u64) -> StoreResult<()> {
        self.backend()?;
        self.writes.stage_activation(timestamp);
        Ok(())
    }

    fn record_event(&mut self, record: EventRecord) -> StoreResult<()> {
        let key = record.key();
        if self.event_applied(&key)? {
            return Err(StoreError::Conflict {
                key: key.to_string(),
            });
        }
        self.writes.events.insert(key, record);
        Ok(())
    }

    fn commit(self) -> StoreResult<()> {
        let Self { backend, writes } = self;
        backend.ensure_open()?;
        if writes.is_empty() {
            return Ok(());
        }
        let rows = writes.len();
        backend.apply(writes)?;
        debug!(rows, "Committed transaction");
        Ok(())
    }

    fn rollback(self) {
        if !self.writes.is_empty() {
            debug!(rows = self.writes.len(), "Rolled back transaction");
        }
    }
}
