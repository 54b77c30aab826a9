//! Query API configuration with validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum requests in one batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Default maximum request body (1 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryApiConfig {
    /// Maximum requests in one JSON-RPC batch
    pub max_batch_size: usize,
    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
}

impl Default for QueryApiConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl QueryApiConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_batch_size cannot be 0".into(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_bytes cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}
