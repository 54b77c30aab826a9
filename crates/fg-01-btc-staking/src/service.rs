//! Power Aggregation Service
//!
//! Computes voting power and activation heights from paginated staking
//! state. Parameters are fetched once per call and shared by every
//! delegation that call examines; nothing is cached between calls.

use crate::domain::{first_active_height, is_delegation_active, ChainParams, NEVER_ACTIVATED};
use crate::error::{GatewayError, GatewayResult};
use crate::pagination::{DelegationPages, FinalityProviderPages};
use crate::ports::outbound::ChainQueryGateway;
use futures::stream::{self, StreamExt, TryStreamExt};
use shared_types::BtcHeight;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Provider public key (hex) -> total active stake in satoshi.
pub type PowerMap = HashMap<String, u64>;

/// Default bound on provider queries in flight for one aggregation call.
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 8;

/// Power Aggregation Engine.
///
/// Multi-provider calls fan out with bounded parallelism. The first failing
/// provider query fails the whole call and no partial map is returned.
pub struct PowerAggregator<G: ?Sized> {
    gateway: Arc<G>,
    max_concurrency: usize,
}

impl<G: ChainQueryGateway + ?Sized> PowerAggregator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            max_concurrency: DEFAULT_MAX_CONCURRENT_QUERIES,
        }
    }

    /// Bound the number of provider queries in flight. Zero is treated as one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Current `(k, w, Q)` from the staking chain.
    pub async fn chain_params(&self) -> GatewayResult<ChainParams> {
        let checkpoint = self.gateway.checkpoint_params().await?;
        let staking = self.gateway.staking_params().await?;
        Ok(ChainParams::from_parts(checkpoint, staking))
    }

    /// Every finality provider registered for `consumer_id`, across all pages.
    pub async fn provider_keys(&self, consumer_id: &str) -> GatewayResult<Vec<String>> {
        let providers = FinalityProviderPages::new(self.gateway.as_ref(), consumer_id)
            .collect_all()
            .await?;
        Ok(providers.into_iter().map(|fp| fp.btc_pk_hex).collect())
    }

    /// Sum of `total_sat` over the provider's delegations active at `btc_height`.
    #[instrument(skip(self), level = "debug")]
    pub async fn active_delegation_power(
        &self,
        fp_btc_pk_hex: &str,
        btc_height: BtcHeight,
    ) -> GatewayResult<u64> {
        let params = self.chain_params().await?;
        self.power_with_params(fp_btc_pk_hex, btc_height, params).await
    }

    /// Power for each provider in `fps` at `btc_height`.
    ///
    /// An empty input yields an empty map without touching the gateway.
    pub async fn multi_provider_power(
        &self,
        fps: &[String],
        btc_height: BtcHeight,
    ) -> GatewayResult<PowerMap> {
        if fps.is_empty() {
            return Ok(PowerMap::new());
        }
        let params = self.chain_params().await?;

        // Each query yields its own (key, power) pair; only this task writes
        // to the map. Dropping the stream on error drops in-flight queries.
        let mut results = stream::iter(fps)
            .map(|fp| async move {
                let power = self.power_with_params(fp, btc_height, params).await?;
                Ok::<_, GatewayError>((fp.clone(), power))
            })
            .buffer_unordered(self.max_concurrency);

        let mut power = PowerMap::with_capacity(fps.len());
        while let Some((fp, sat)) = results.try_next().await? {
            power.insert(fp, sat);
        }

        debug!(
            providers = power.len(),
            btc_height, "Aggregated provider power"
        );
        Ok(power)
    }

    /// Total active stake across `fps`. Duplicate keys are counted once.
    pub async fn total_power(&self, fps: &[String], btc_height: BtcHeight) -> GatewayResult<u64> {
        let power = self.multi_provider_power(fps, btc_height).await?;
        Ok(power.values().fold(0u64, |acc, sat| acc.saturating_add(*sat)))
    }

    /// Minimum first-active height over every delegation of every provider.
    ///
    /// Returns [`NEVER_ACTIVATED`] if `fps` is empty or nothing has activated.
    pub async fn earliest_activation_height(&self, fps: &[String]) -> GatewayResult<BtcHeight> {
        if fps.is_empty() {
            return Ok(NEVER_ACTIVATED);
        }
        let params = self.chain_params().await?;
        let tip_height = self.gateway.btc_tip_height().await?;

        let earliest = stream::iter(fps)
            .map(|fp| self.earliest_with_params(fp, tip_height, params))
            .buffer_unordered(self.max_concurrency)
            .try_fold(NEVER_ACTIVATED, |acc, height| async move { Ok(acc.min(height)) })
            .await?;

        debug!(earliest, tip_height, "Computed earliest activation height");
        Ok(earliest)
    }

    /// Earliest first-active height over one provider's delegations.
    pub async fn fp_earliest_activation_height(&self, fp_btc_pk_hex: &str) -> GatewayResult<BtcHeight> {
        let params = self.chain_params().await?;
        let tip_height = self.gateway.btc_tip_height().await?;
        self.earliest_with_params(fp_btc_pk_hex, tip_height, params).await
    }

    async fn power_with_params(
        &self,
        fp_btc_pk_hex: &str,
        btc_height: BtcHeight,
        params: ChainParams,
    ) -> GatewayResult<u64> {
        DelegationPages::new(self.gateway.as_ref(), fp_btc_pk_hex)
            .stream()
            .try_fold(0u64, |acc, page| async move {
                Ok(page
                    .iter()
                    .filter(|del| is_delegation_active(del, btc_height, &params))
                    .fold(acc, |sum, del| sum.saturating_add(del.total_sat)))
            })
            .await
    }

    async fn earliest_with_params(
        &self,
        fp_btc_pk_hex: &str,
        tip_height: BtcHeight,
        params: ChainParams,
    ) -> GatewayResult<BtcHeight> {
        DelegationPages::new(self.gateway.as_ref(), fp_btc_pk_hex)
            .stream()
            .try_fold(NEVER_ACTIVATED, |acc, page| async move {
                Ok(page
                    .iter()
                    .map(|del| first_active_height(del, tip_height, &params))
                    .fold(acc, BtcHeight::min))
            })
            .await
    }
}
