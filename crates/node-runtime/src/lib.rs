//! # Node Runtime Library
//!
//! Runtime pieces of the finality gadget binary, exposed for testing.
//! The entry point is `main.rs`.
//!
//! - `config` - node configuration, JSON file plus env overrides
//! - `logging` - tracing subscriber setup
//! - `genesis` - seeds the store from a staking chain snapshot
//! - `runtime` - service lifecycle and query listeners

pub mod config;
pub mod genesis;
pub mod logging;
pub mod runtime;

pub use config::{ChainConfig, ConfigError, NodeConfig, ServerConfig, StorageBackend, StorageConfig};
pub use genesis::{seed_from_snapshot, GenesisError, GenesisSnapshot};
pub use runtime::{RuntimeError, RuntimeState, ServiceRuntime};
