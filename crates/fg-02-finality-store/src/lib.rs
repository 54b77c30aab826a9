//! # fg-02-finality-store
//!
//! Transactional store for finality state.
//!
//! ## Relations
//!
//! | Relation | Key | Notes |
//! |----------|-----|-------|
//! | blocks | height | hash is a secondary index, finalized never downgrades |
//! | finality providers | BTC pk | upserted snapshots |
//! | delegations | staking tx hash | upserted snapshots |
//! | applied events | (tx hash, event index) | guarded insert, append-only |
//! | activation | singleton | keeps the earliest timestamp |
//!
//! ## Implementations
//!
//! - [`InMemoryFinalityStore`]: map-backed fake for unit tests
//! - [`KvFinalityStore`]: over any [`KeyValueStore`]; [`InMemoryKVStore`] for
//!   tests and `RocksDbStore` (feature `rocksdb`) in production
//!
//! Both stage writes in a [`StagedTransaction`] and validate guarded inserts
//! under the store's write lock at commit.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::kv::{InMemoryKVStore, KvFinalityStore};
pub use adapters::memory::InMemoryFinalityStore;
pub use adapters::transaction::{StagedTransaction, StoreBackend};
pub use domain::errors::{KVStoreError, StoreError, StoreResult};
pub use domain::write_set::WriteSet;
pub use ports::inbound::{FinalityStore, StoreTransaction};
pub use ports::outbound::{BatchOperation, KeyValueStore, ScanResult};

#[cfg(feature = "rocksdb")]
pub use adapters::kv::rocksdb::{RocksDbConfig, RocksDbStore};
