//! Finality store over a raw key-value backend.
//!
//! Values are bincode-encoded entities; see [`keys`](crate::domain::keys)
//! for the key layout. The latest-finalized pointer and the activation
//! record are written in the same batch as the rows they summarize.

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb;

pub use memory::InMemoryKVStore;

use crate::adapters::transaction::{StagedTransaction, StoreBackend};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::keys;
use crate::domain::write_set::{merge_block, settled_activation, WriteSet};
use crate::ports::inbound::FinalityStore;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Block, BtcDelegation, EventKey, EventRecord, FinalityProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    Ok(bincode::deserialize(bytes)?)
}

fn read<K: KeyValueStore, T: DeserializeOwned>(kv: &K, key: &[u8]) -> StoreResult<Option<T>> {
    kv.get(key)?.map(|bytes| decode(&bytes)).transpose()
}

fn read_u64<K: KeyValueStore>(kv: &K, key: &[u8]) -> StoreResult<Option<u64>> {
    match kv.get(key)? {
        None => Ok(None),
        Some(bytes) => keys::decode_u64(&bytes)
            .map(Some)
            .ok_or_else(|| StoreError::Codec {
                reason: format!("expected 8-byte integer, found {} bytes", bytes.len()),
            }),
    }
}

pub struct KvBackend<K> {
    kv: RwLock<K>,
    closed: AtomicBool,
}

impl<K: KeyValueStore + 'static> StoreBackend for KvBackend<K> {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::closed());
        }
        Ok(())
    }

    fn block_by_height(&self, height: u64) -> StoreResult<Option<Block>> {
        read(&*self.kv.read(), &keys::block_key(height))
    }

    fn block_height_by_hash(&self, hash: &str) -> StoreResult<Option<u64>> {
        read_u64(&*self.kv.read(), &keys::block_hash_key(hash))
    }

    fn latest_finalized_block(&self) -> StoreResult<Option<Block>> {
        let kv = self.kv.read();
        match read_u64(&*kv, keys::LATEST_FINALIZED_KEY)? {
            Some(height) => read(&*kv, &keys::block_key(height)),
            None => Ok(None),
        }
    }

    fn finality_provider(&self, btc_pk_hex: &str) -> StoreResult<Option<FinalityProvider>> {
        read(&*self.kv.read(), &keys::provider_key(btc_pk_hex))
    }

    fn delegation(&self, staking_tx_hash_hex: &str) -> StoreResult<Option<BtcDelegation>> {
        read(&*self.kv.read(), &keys::delegation_key(staking_tx_hash_hex))
    }

    fn event_recorded(&self, key: &EventKey) -> StoreResult<bool> {
        Ok(self.kv.read().exists(&keys::event_key(key))?)
    }

    fn activated_timestamp(&self) -> StoreResult<Option<u64>> {
        read_u64(&*self.kv.read(), keys::ACTIVATED_KEY)
    }

    fn apply(&self, writes: WriteSet) -> StoreResult<()> {
        let mut kv = self.kv.write();
        self.ensure_open()?;

        for key in writes.events.keys() {
            if kv.exists(&keys::event_key(key))? {
                return Err(StoreError::Conflict {
                    key: key.to_string(),
                });
            }
        }

        let mut ops = Vec::with_capacity(writes.len() * 2 + 2);

        let committed_latest = read_u64(&*kv, keys::LATEST_FINALIZED_KEY)?;
        let mut latest = committed_latest;
        for (height, block) in writes.blocks {
            let existing: Option<Block> = read(&*kv, &keys::block_key(height))?;
            let Some(block) = merge_block(existing.as_ref(), block) else {
                continue;
            };
            if let Some(old) = existing.filter(|old| old.hash != block.hash) {
                ops.push(BatchOperation::delete(keys::block_hash_key(&old.hash)));
            }
            if block.finalized {
                latest = Some(latest.map_or(height, |h| h.max(height)));
            }
            ops.push(BatchOperation::put(
                keys::block_hash_key(&block.hash),
                keys::encode_u64(height),
            ));
            ops.push(BatchOperation::put(keys::block_key(height), encode(&block)?));
        }
        if let Some(height) = latest.filter(|_| latest != committed_latest) {
            ops.push(BatchOperation::put(
                keys::LATEST_FINALIZED_KEY,
                keys::encode_u64(height),
            ));
        }

        for (pk, fp) in &writes.providers {
            ops.push(BatchOperation::put(keys::provider_key(pk), encode(fp)?));
        }
        for (hash, del) in &writes.delegations {
            ops.push(BatchOperation::put(keys::delegation_key(hash), encode(del)?));
        }
        for (key, record) in &writes.events {
            ops.push(BatchOperation::put(keys::event_key(key), encode(record)?));
        }

        if let Some(timestamp) = writes.activated {
            let current = read_u64(&*kv, keys::ACTIVATED_KEY)?;
            let settled = settled_activation(current, timestamp);
            if current != Some(settled) {
                ops.push(BatchOperation::put(
                    keys::ACTIVATED_KEY,
                    keys::encode_u64(settled),
                ));
            }
        }

        if ops.is_empty() {
            return Ok(());
        }
        kv.atomic_batch_write(ops)?;
        Ok(())
    }
}

/// [`FinalityStore`] over any [`KeyValueStore`]. Clones share the backend.
pub struct KvFinalityStore<K> {
    backend: Arc<KvBackend<K>>,
}

impl<K> Clone for KvFinalityStore<K> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
        }
    }
}

impl<K: KeyValueStore + 'static> KvFinalityStore<K> {
    pub fn new(kv: K) -> Self {
        Self {
            backend: Arc::new(KvBackend {
                kv: RwLock::new(kv),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Every applied event, ordered by key.
    pub fn applied_events(&self) -> StoreResult<Vec<EventRecord>> {
        self.backend.ensure_open()?;
        let kv = self.backend.kv.read();
        kv.prefix_scan(keys::EVENT_PREFIX)?
            .iter()
            .map(|(_, value)| decode(value))
            .collect()
    }
}

impl<K: KeyValueStore + 'static> FinalityStore for KvFinalityStore<K> {
    type Tx = StagedTransaction<KvBackend<K>>;

    fn begin_tx(&self) -> StoreResult<Self::Tx> {
        self.backend.ensure_open()?;
        Ok(StagedTransaction::new(self.backend.clone()))
    }

    fn close(&self) -> StoreResult<()> {
        let mut kv = self.backend.kv.write();
        if self.backend.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        kv.flush()?;
        info!("Finality store closed");
        Ok(())
    }
}
