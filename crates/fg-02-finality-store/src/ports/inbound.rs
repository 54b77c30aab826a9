//! # Inbound Ports (Driving Ports)
//!
//! The persistence contract the finality service is written against. Any
//! implementation can be swapped in without touching the service.

use crate::domain::errors::{StoreError, StoreResult};
use shared_types::{Block, BtcDelegation, EventKey, EventRecord, FinalityProvider};
use tracing::debug;

/// One transactional scope.
///
/// Reads see this transaction's own staged writes layered over committed
/// state. Nothing is visible to other transactions until [`commit`].
/// Dropping a transaction without committing discards its writes.
///
/// [`commit`]: StoreTransaction::commit
pub trait StoreTransaction: Send {
    fn get_block_by_height(&self, height: u64) -> StoreResult<Option<Block>>;

    fn get_block_by_hash(&self, hash: &str) -> StoreResult<Option<Block>>;

    /// Highest-height finalized block.
    fn latest_finalized_block(&self) -> StoreResult<Option<Block>>;

    fn get_finality_provider(&self, btc_pk_hex: &str) -> StoreResult<Option<FinalityProvider>>;

    fn get_delegation(&self, staking_tx_hash_hex: &str) -> StoreResult<Option<BtcDelegation>>;

    fn activated_timestamp(&self) -> StoreResult<Option<u64>>;

    /// Whether the event log already holds `key`.
    fn event_applied(&self, key: &EventKey) -> StoreResult<bool>;

    /// Upsert by height. A finalized block is never downgraded.
    fn insert_block(&mut self, block: Block) -> StoreResult<()>;

    fn upsert_finality_provider(&mut self, fp: FinalityProvider) -> StoreResult<()>;

    fn upsert_delegation(&mut self, del: BtcDelegation) -> StoreResult<()>;

    /// Record the activation timestamp. The first timestamp saved stands.
    fn save_activated_timestamp(&mut self, timestamp: u64) -> StoreResult<()>;

    /// Guarded insert into the applied-event log.
    ///
    /// Fails with [`StoreError::Conflict`] if the key is already recorded.
    fn record_event(&mut self, record: EventRecord) -> StoreResult<()>;

    /// Make every staged write visible atomically.
    ///
    /// Fails with [`StoreError::Conflict`] if another transaction recorded one
    /// of this transaction's events first; nothing is written in that case.
    fn commit(self) -> StoreResult<()>;

    /// Discard every staged write.
    fn rollback(self);
}

/// Durable store of finality state.
///
/// Only [`begin_tx`](FinalityStore::begin_tx) and
/// [`close`](FinalityStore::close) are required. Everything else runs in a
/// transaction of its own.
pub trait FinalityStore: Send + Sync + 'static {
    type Tx: StoreTransaction;

    /// Open a transactional scope. Fails once the store is closed.
    fn begin_tx(&self) -> StoreResult<Self::Tx>;

    /// Release the backing store. Idempotent; later operations fail.
    fn close(&self) -> StoreResult<()>;

    fn commit_tx(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.commit()
    }

    fn rollback_tx(&self, tx: Self::Tx) {
        tx.rollback()
    }

    fn insert_block(&self, block: Block) -> StoreResult<()> {
        let mut tx = self.begin_tx()?;
        tx.insert_block(block)?;
        tx.commit()
    }

    fn get_block_by_height(&self, height: u64) -> StoreResult<Block> {
        self.begin_tx()?
            .get_block_by_height(height)?
            .ok_or_else(|| StoreError::not_found(format!("block at height {height}")))
    }

    fn get_block_by_hash(&self, hash: &str) -> StoreResult<Block> {
        self.begin_tx()?
            .get_block_by_hash(hash)?
            .ok_or_else(|| StoreError::not_found(format!("block with hash {hash}")))
    }

    fn is_block_finalized_by_height(&self, height: u64) -> StoreResult<bool> {
        Ok(self.get_block_by_height(height)?.finalized)
    }

    fn is_block_finalized_by_hash(&self, hash: &str) -> StoreResult<bool> {
        Ok(self.get_block_by_hash(hash)?.finalized)
    }

    fn latest_finalized_block(&self) -> StoreResult<Block> {
        self.begin_tx()?
            .latest_finalized_block()?
            .ok_or_else(|| StoreError::not_found("finalized block"))
    }

    fn activated_timestamp(&self) -> StoreResult<u64> {
        self.begin_tx()?
            .activated_timestamp()?
            .ok_or_else(|| StoreError::not_found("activation record"))
    }

    fn save_activated_timestamp(&self, timestamp: u64) -> StoreResult<()> {
        let mut tx = self.begin_tx()?;
        tx.save_activated_timestamp(timestamp)?;
        tx.commit()
    }

    fn get_finality_provider(&self, btc_pk_hex: &str) -> StoreResult<FinalityProvider> {
        self.begin_tx()?
            .get_finality_provider(btc_pk_hex)?
            .ok_or_else(|| StoreError::not_found(format!("finality provider {btc_pk_hex}")))
    }

    fn get_delegation(&self, staking_tx_hash_hex: &str) -> StoreResult<BtcDelegation> {
        self.begin_tx()?
            .get_delegation(staking_tx_hash_hex)?
            .ok_or_else(|| StoreError::not_found(format!("delegation {staking_tx_hash_hex}")))
    }

    /// Bulk-load providers in one transaction.
    fn save_initial_finality_providers(&self, fps: Vec<FinalityProvider>) -> StoreResult<()> {
        let count = fps.len();
        let mut tx = self.begin_tx()?;
        for fp in fps {
            tx.upsert_finality_provider(fp)?;
        }
        tx.commit()?;
        debug!(count, "Saved initial finality providers");
        Ok(())
    }

    /// Bulk-load delegations in one transaction.
    fn save_initial_delegations(&self, dels: Vec<BtcDelegation>) -> StoreResult<()> {
        let count = dels.len();
        let mut tx = self.begin_tx()?;
        for del in dels {
            tx.upsert_delegation(del)?;
        }
        tx.commit()?;
        debug!(count, "Saved initial delegations");
        Ok(())
    }
}
