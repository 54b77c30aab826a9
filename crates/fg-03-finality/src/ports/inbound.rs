//! Driving Ports (API - Inbound)

use crate::error::FinalityResult;
use async_trait::async_trait;
use shared_types::Block;

/// Read-only finality queries served to external callers.
///
/// Every operation is idempotent. An unknown block or a chain that has not
/// activated yet fails with `NotFound`, never with a default value.
#[async_trait]
pub trait FinalityQueryApi: Send + Sync {
    async fn is_block_finalized_by_height(&self, height: u64) -> FinalityResult<bool>;

    async fn is_block_finalized_by_hash(&self, hash: &str) -> FinalityResult<bool>;

    /// Highest-height finalized block
    async fn latest_finalized_block(&self) -> FinalityResult<Block>;

    /// Unix timestamp at which the consumer chain's finality went live
    async fn activated_timestamp(&self) -> FinalityResult<u64>;
}
