//! Error types for the finality store

use thiserror::Error;

/// Finality store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Requested row does not exist
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// The backing store failed or the store is closed
    #[error("Persistence failure: {reason}")]
    Persistence { reason: String },

    /// A guarded insert clashed with an existing row
    #[error("Conflict: {key} already recorded")]
    Conflict { key: String },

    /// A stored value could not be encoded or decoded
    #[error("Codec error: {reason}")]
    Codec { reason: String },
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound { what: what.into() }
    }

    pub fn closed() -> Self {
        StoreError::Persistence {
            reason: "store is closed".to_string(),
        }
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Codec {
            reason: err.to_string(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value backend errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KVStoreError {
    /// I/O error during read/write
    #[error("KV store I/O error: {message}")]
    IOError { message: String },
}

impl From<KVStoreError> for StoreError {
    fn from(err: KVStoreError) -> Self {
        StoreError::Persistence {
            reason: err.to_string(),
        }
    }
}
