//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The wire-level staking-chain client lives outside this crate; it only has
//! to satisfy [`ChainQueryGateway`].

use crate::domain::{CheckpointParams, StakingParams};
use crate::error::GatewayResult;
use async_trait::async_trait;
use shared_types::{BtcDelegation, BtcHeight, FinalityProvider};

/// Opaque continuation cursor returned by a paginated query.
pub type PageKey = Vec<u8>;

/// One page of a paginated query.
///
/// `next_key` of `None` (or an empty key) marks the end of the set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_key: Option<PageKey>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_key: None,
        }
    }

    pub fn with_next(items: Vec<T>, next_key: PageKey) -> Self {
        Self {
            items,
            next_key: Some(next_key),
        }
    }

    /// Continuation cursor, if there is another page.
    pub fn continuation(&self) -> Option<&PageKey> {
        self.next_key.as_ref().filter(|key| !key.is_empty())
    }
}

/// Read access to the staking chain.
///
/// Implementations are shared across tasks and must tolerate concurrent
/// calls. Timeouts and retries, if any, belong to the implementation.
#[async_trait]
pub trait ChainQueryGateway: Send + Sync {
    /// Finality providers registered for a consumer chain
    async fn list_finality_providers(
        &self,
        consumer_id: &str,
        cursor: Option<PageKey>,
    ) -> GatewayResult<Page<FinalityProvider>>;

    /// Delegations backing one finality provider
    async fn list_delegations(
        &self,
        fp_btc_pk_hex: &str,
        cursor: Option<PageKey>,
    ) -> GatewayResult<Page<BtcDelegation>>;

    /// Point lookup of a delegation by staking tx hash
    async fn get_delegation(&self, staking_tx_hash_hex: &str) -> GatewayResult<Option<BtcDelegation>>;

    /// Current `k` and `w`
    async fn checkpoint_params(&self) -> GatewayResult<CheckpointParams>;

    /// Current covenant quorum `Q`
    async fn staking_params(&self) -> GatewayResult<StakingParams>;

    /// Height of the BTC light-client tip
    async fn btc_tip_height(&self) -> GatewayResult<BtcHeight>;
}
