//! Error types for the finality subsystem

use fg_01_btc_staking::GatewayError;
use fg_02_finality_store::StoreError;
use thiserror::Error;

/// Finality subsystem errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FinalityError {
    /// Requested block or activation record does not exist
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Staking chain query failed
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] GatewayError),

    /// Transaction failed and was rolled back
    #[error("Persistence failure: {reason}")]
    PersistenceFailure { reason: String },

    /// Event names a provider that was never registered
    #[error("Unknown finality provider: {btc_pk_hex}")]
    UnknownFinalityProvider { btc_pk_hex: String },

    /// Event names a delegation that was never seeded
    #[error("Unknown delegation: {staking_tx_hash_hex}")]
    UnknownDelegation { staking_tx_hash_hex: String },
}

impl FinalityError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FinalityError::NotFound { .. })
    }
}

impl From<StoreError> for FinalityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { what } => FinalityError::NotFound { what },
            other => FinalityError::PersistenceFailure {
                reason: other.to_string(),
            },
        }
    }
}

/// Result type for finality operations
pub type FinalityResult<T> = Result<T, FinalityError>;
