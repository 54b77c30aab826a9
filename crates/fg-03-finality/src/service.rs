//! Finality Service - stored finality state and event ingestion

use crate::domain::{apply_chain_event, EventOutcome};
use crate::error::{FinalityError, FinalityResult};
use crate::ports::inbound::FinalityQueryApi;
use crate::ports::outbound::{FinalityStore, StoreTransaction};
use async_trait::async_trait;
use fg_02_finality_store::StoreError;
use shared_types::{Block, BtcDelegation, ChainEvent, EventKey, EventRecord, FinalityProvider, TxInfo};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Finality Determination Service.
///
/// Generic over the store so the in-memory fake and the durable backend are
/// interchangeable.
pub struct FinalityService<S: FinalityStore> {
    store: Arc<S>,
}

impl<S: FinalityStore> FinalityService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Apply one event inside the caller's transaction.
    ///
    /// Returns [`EventOutcome::AlreadyApplied`] without touching state if the
    /// `(tx_info, event_index)` key is already recorded, either committed or
    /// earlier in `tx`. On error the caller must roll `tx` back.
    pub fn apply_event(
        &self,
        tx: &mut S::Tx,
        tx_info: &TxInfo,
        event_index: u32,
        event: ChainEvent,
    ) -> FinalityResult<EventOutcome> {
        let key = EventKey::new(tx_info.tx_hash.clone(), event_index);
        if tx.event_applied(&key)? {
            debug!(event = %key, "Event already applied");
            return Ok(EventOutcome::AlreadyApplied);
        }

        apply_chain_event(tx, &event)?;
        tx.record_event(EventRecord {
            tx_info: tx_info.clone(),
            event_index,
            event,
        })?;
        Ok(EventOutcome::Applied)
    }

    /// Apply one event in a transaction of its own.
    ///
    /// Commits on success and rolls back on any error. Losing a commit race to
    /// a transaction that recorded the same key counts as already applied.
    pub fn process_event(
        &self,
        tx_info: &TxInfo,
        event_index: u32,
        event: ChainEvent,
    ) -> FinalityResult<EventOutcome> {
        let kind = event.kind();
        let mut tx = self.store.begin_tx()?;

        match self.apply_event(&mut tx, tx_info, event_index, event) {
            Ok(EventOutcome::Applied) => match tx.commit() {
                Ok(()) => {
                    debug!(kind, tx_hash = %tx_info.tx_hash, event_index, "Applied event");
                    Ok(EventOutcome::Applied)
                }
                Err(StoreError::Conflict { key }) => {
                    debug!(event = %key, "Event applied concurrently");
                    Ok(EventOutcome::AlreadyApplied)
                }
                Err(e) => Err(e.into()),
            },
            Ok(EventOutcome::AlreadyApplied) => {
                tx.rollback();
                Ok(EventOutcome::AlreadyApplied)
            }
            Err(e) => {
                tx.rollback();
                warn!(kind, tx_hash = %tx_info.tx_hash, event_index, error = %e, "Event rolled back");
                Err(e)
            }
        }
    }

    /// Bulk-load the baseline providers and delegations before event
    /// streaming starts. All or nothing.
    pub fn seed_initial_state(
        &self,
        fps: Vec<FinalityProvider>,
        dels: Vec<BtcDelegation>,
    ) -> FinalityResult<()> {
        let (fp_count, del_count) = (fps.len(), dels.len());
        let mut tx = self.store.begin_tx()?;
        for fp in fps {
            tx.upsert_finality_provider(fp)?;
        }
        for del in dels {
            tx.upsert_delegation(del)?;
        }
        tx.commit()?;
        info!(
            providers = fp_count,
            delegations = del_count,
            "Seeded initial staking state"
        );
        Ok(())
    }

    /// Persist a block and its verdict. A finalized block stays finalized.
    pub fn record_block(&self, block: Block) -> FinalityResult<()> {
        let (height, finalized) = (block.height, block.finalized);
        self.store.insert_block(block)?;
        debug!(height, finalized, "Recorded block");
        Ok(())
    }

    /// Persist the activation timestamp. An earlier record is never replaced
    /// by a later one.
    pub fn record_activation(&self, timestamp: u64) -> FinalityResult<()> {
        self.store.save_activated_timestamp(timestamp)?;
        Ok(())
    }

    fn query<T>(&self, what: &str, result: Result<T, StoreError>) -> FinalityResult<T> {
        result.map_err(|e| {
            let e = FinalityError::from(e);
            if e.is_not_found() {
                debug!(query = what, "{e}");
            } else {
                warn!(query = what, error = %e, "Finality query failed");
            }
            e
        })
    }
}

#[async_trait]
impl<S: FinalityStore> FinalityQueryApi for FinalityService<S> {
    async fn is_block_finalized_by_height(&self, height: u64) -> FinalityResult<bool> {
        self.query("is_block_finalized_by_height", self.store.is_block_finalized_by_height(height))
    }

    async fn is_block_finalized_by_hash(&self, hash: &str) -> FinalityResult<bool> {
        self.query("is_block_finalized_by_hash", self.store.is_block_finalized_by_hash(hash))
    }

    async fn latest_finalized_block(&self) -> FinalityResult<Block> {
        self.query("latest_finalized_block", self.store.latest_finalized_block())
    }

    async fn activated_timestamp(&self) -> FinalityResult<u64> {
        self.query("activated_timestamp", self.store.activated_timestamp())
    }
}
