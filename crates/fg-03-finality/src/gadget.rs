//! Finality gadget: combines aggregated BTC-staked power with the 2/3
//! threshold and persists the verdict.

use crate::domain::{has_quorum, required_power};
use crate::error::FinalityResult;
use crate::ports::outbound::{ChainQueryGateway, FinalityStore};
use crate::service::FinalityService;
use fg_01_btc_staking::{DelegationPages, FinalityProviderPages, PowerAggregator, NEVER_ACTIVATED};
use shared_types::{Block, BtcDelegation, BtcHeight};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of evaluating one consumer-chain block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalityVerdict {
    pub height: u64,
    pub btc_height: BtcHeight,
    pub voted_power: u64,
    pub total_power: u64,
    pub finalized: bool,
}

impl FinalityVerdict {
    /// Power still missing for quorum, zero once finalized.
    pub fn missing_power(&self) -> u64 {
        if self.finalized {
            return 0;
        }
        required_power(self.total_power).saturating_sub(self.voted_power)
    }
}

/// Counts written by [`FinalityGadget::bootstrap`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub providers: usize,
    pub delegations: usize,
}

pub struct FinalityGadget<G: ?Sized, S: FinalityStore> {
    aggregator: PowerAggregator<G>,
    service: Arc<FinalityService<S>>,
    consumer_id: String,
}

impl<G, S> FinalityGadget<G, S>
where
    G: ChainQueryGateway + ?Sized,
    S: FinalityStore,
{
    pub fn new(
        aggregator: PowerAggregator<G>,
        service: Arc<FinalityService<S>>,
        consumer_id: impl Into<String>,
    ) -> Self {
        Self {
            aggregator,
            service,
            consumer_id: consumer_id.into(),
        }
    }

    pub fn consumer_id(&self) -> &str {
        &self.consumer_id
    }

    pub fn service(&self) -> &Arc<FinalityService<S>> {
        &self.service
    }

    /// Decide and persist whether `block` is finalized by `voters` at
    /// `btc_height`.
    ///
    /// Total power is summed over every provider registered for the consumer
    /// chain. Voters outside that set, and repeated voters, add nothing. Any
    /// gateway failure aborts before anything is persisted.
    pub async fn evaluate_block(
        &self,
        block: Block,
        btc_height: BtcHeight,
        voters: &[String],
    ) -> FinalityResult<FinalityVerdict> {
        let providers = self.aggregator.provider_keys(&self.consumer_id).await?;
        let power = self.aggregator.multi_provider_power(&providers, btc_height).await?;

        let total_power = power.values().fold(0u64, |acc, p| acc.saturating_add(*p));
        let voted_power = voters
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|fp| power.get(fp))
            .fold(0u64, |acc, p| acc.saturating_add(*p));

        let verdict = FinalityVerdict {
            height: block.height,
            btc_height,
            voted_power,
            total_power,
            finalized: has_quorum(voted_power, total_power),
        };

        self.service.record_block(Block {
            finalized: verdict.finalized,
            ..block
        })?;

        debug!(
            height = verdict.height,
            voted_power, total_power, finalized = verdict.finalized, "Evaluated block"
        );
        Ok(verdict)
    }

    /// Record the activation timestamp once any provider's stake has activated.
    ///
    /// `to_timestamp` converts the earliest activation BTC height to unix
    /// time. Returns `None` while nothing has activated.
    pub async fn sync_activation<F>(&self, to_timestamp: F) -> FinalityResult<Option<u64>>
    where
        F: FnOnce(BtcHeight) -> FinalityResult<u64>,
    {
        let providers = self.aggregator.provider_keys(&self.consumer_id).await?;
        let height = self.aggregator.earliest_activation_height(&providers).await?;
        if height == NEVER_ACTIVATED {
            debug!(consumer_id = %self.consumer_id, "Consumer chain not activated yet");
            return Ok(None);
        }

        let timestamp = to_timestamp(height)?;
        self.service.record_activation(timestamp)?;
        info!(btc_height = height, timestamp, "Consumer chain finality activated");
        Ok(Some(timestamp))
    }

    /// Load every provider of the consumer chain and all their delegations
    /// from the staking chain and seed the store with them.
    pub async fn bootstrap(&self) -> FinalityResult<BootstrapSummary> {
        let gateway = self.aggregator.gateway().as_ref();
        let providers = FinalityProviderPages::new(gateway, &self.consumer_id)
            .collect_all()
            .await?;

        // A delegation restaked to several providers is listed under each.
        let mut delegations: BTreeMap<String, BtcDelegation> = BTreeMap::new();
        for fp in &providers {
            for del in DelegationPages::new(gateway, &fp.btc_pk_hex).collect_all().await? {
                delegations.entry(del.staking_tx_hash_hex.clone()).or_insert(del);
            }
        }

        let summary = BootstrapSummary {
            providers: providers.len(),
            delegations: delegations.len(),
        };
        self.service
            .seed_initial_state(providers, delegations.into_values().collect())?;
        Ok(summary)
    }
}
