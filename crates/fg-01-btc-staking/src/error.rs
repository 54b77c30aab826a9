//! Error types for the chain query gateway

use thiserror::Error;

/// Chain query gateway errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The staking chain could not be reached or rejected the query
    #[error("Upstream unavailable: {reason}")]
    Unavailable { reason: String },

    /// The staking chain answered with something we cannot use
    #[error("Invalid upstream response: {reason}")]
    InvalidResponse { reason: String },
}

impl GatewayError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        GatewayError::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
