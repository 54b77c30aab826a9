//! # Node Configuration
//!
//! Configuration for the query listeners, the finality store and the
//! staking chain.
//!
//! Loaded from an optional JSON file named by `FG_CONFIG`, then overridden
//! by environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `FG_LISTEN_ADDR` | `server.listen_addrs` (comma separated) |
//! | `FG_DATA_DIR` | `storage.data_dir` |
//! | `FG_STORAGE` | `storage.backend` (`memory` or `rocksdb`) |
//! | `FG_CONSUMER_ID` | `chain.consumer_id` |
//! | `FG_GENESIS` | `chain.genesis_file` |

use fg_01_btc_staking::DEFAULT_MAX_CONCURRENT_QUERIES;
use fg_04_query_api::QueryApiConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub chain: ChainConfig,
}

/// Query listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Addresses the JSON-RPC query interface binds, one listener each.
    pub listen_addrs: Vec<SocketAddr>,
    /// Request limits applied by every listener.
    #[serde(flatten)]
    pub api: QueryApiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addrs: vec![SocketAddr::from(([127, 0, 0, 1], 50051))],
            api: QueryApiConfig::default(),
        }
    }
}

/// Which finality store implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    RocksDb,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "rocksdb" => Ok(StorageBackend::RocksDb),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database directory for the RocksDB backend.
    pub data_dir: PathBuf,
    /// fsync every write batch.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data/finality"),
            sync_writes: true,
        }
    }
}

/// Staking chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Consumer chain whose finality providers are tracked.
    pub consumer_id: String,
    /// Upper bound on concurrent per-provider power queries.
    pub max_concurrent_queries: usize,
    /// Optional genesis snapshot used to seed the store at startup.
    pub genesis_file: Option<PathBuf>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            consumer_id: "consumer-1".to_string(),
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            genesis_file: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unknown storage backend: {0}")]
    UnknownBackend(String),

    #[error("invalid listen address {value:?}: {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Api(#[from] fg_04_query_api::ConfigError),
}

impl NodeConfig {
    /// Load configuration from `FG_CONFIG` (if set) and apply env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("FG_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(?path, "Loaded configuration file");
        Ok(config)
    }

    /// Apply overrides from `lookup`, normally `std::env::var`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addrs) = lookup("FG_LISTEN_ADDR") {
            self.server.listen_addrs = parse_addrs(&addrs)?;
        }
        if let Some(dir) = lookup("FG_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("FG_STORAGE") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(consumer_id) = lookup("FG_CONSUMER_ID") {
            self.chain.consumer_id = consumer_id;
        }
        if let Some(genesis) = lookup("FG_GENESIS") {
            self.chain.genesis_file = Some(PathBuf::from(genesis));
        }
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen_addrs.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one listen address is required".into(),
            ));
        }
        if self.chain.consumer_id.is_empty() {
            return Err(ConfigError::Invalid("consumer_id must not be empty".into()));
        }
        if self.chain.max_concurrent_queries == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_queries must be > 0".into(),
            ));
        }
        if self.storage.backend == StorageBackend::RocksDb && !cfg!(feature = "rocksdb") {
            warn!("RocksDB backend requested but node was built without the rocksdb feature");
            return Err(ConfigError::Invalid(
                "storage backend rocksdb requires the rocksdb feature".into(),
            ));
        }
        self.server.api.validate()?;
        Ok(())
    }
}

fn parse_addrs(raw: &str) -> Result<Vec<SocketAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddress {
                value: s.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}
