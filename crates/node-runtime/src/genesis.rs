//! # Genesis Snapshot
//!
//! A JSON snapshot of the staking chain used to seed the finality store at
//! startup, before event streaming begins.
//!
//! ```json
//! {
//!   "checkpoint": { "btc_confirmation_depth": 6, "checkpoint_finalization_timeout": 20 },
//!   "staking": { "covenant_quorum": 1 },
//!   "btc_tip_height": 850000,
//!   "finality_providers": [ { "btc_pk_hex": "..", "consumer_id": "consumer-1" } ],
//!   "delegations": [ { "staking_tx_hash_hex": "..", "fp_btc_pk_list": [".."] } ]
//! }
//! ```

use fg_01_btc_staking::adapters::InMemoryChainGateway;
use fg_01_btc_staking::{CheckpointParams, PowerAggregator, StakingParams};
use fg_02_finality_store::FinalityStore;
use fg_03_finality::{BootstrapSummary, FinalityError, FinalityGadget, FinalityService};
use serde::{Deserialize, Serialize};
use shared_types::{BtcDelegation, BtcHeight, FinalityProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::ChainConfig;

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("failed to read genesis file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse genesis file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to seed finality store: {0}")]
    Seed(#[from] FinalityError),
}

/// Staking chain state at genesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisSnapshot {
    pub checkpoint: CheckpointParams,
    pub staking: StakingParams,
    #[serde(default)]
    pub btc_tip_height: BtcHeight,
    #[serde(default)]
    pub finality_providers: Vec<FinalityProvider>,
    #[serde(default)]
    pub delegations: Vec<BtcDelegation>,
}

impl GenesisSnapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GenesisError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| GenesisError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| GenesisError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serve the snapshot through the chain query port.
    pub fn into_gateway(self) -> InMemoryChainGateway {
        let gateway = InMemoryChainGateway::new()
            .with_params(
                self.checkpoint.btc_confirmation_depth,
                self.checkpoint.checkpoint_finalization_timeout,
                self.staking.covenant_quorum,
            )
            .with_tip(self.btc_tip_height);
        for fp in self.finality_providers {
            gateway.add_finality_provider(fp);
        }
        for del in self.delegations {
            gateway.add_delegation(del);
        }
        gateway
    }
}

/// Seed `service`'s store with the consumer chain's providers and their
/// delegations from `snapshot`.
pub async fn seed_from_snapshot<S: FinalityStore>(
    snapshot: GenesisSnapshot,
    chain: &ChainConfig,
    service: Arc<FinalityService<S>>,
) -> Result<BootstrapSummary, GenesisError> {
    let aggregator = PowerAggregator::new(Arc::new(snapshot.into_gateway()))
        .with_max_concurrency(chain.max_concurrent_queries);
    let gadget = FinalityGadget::new(aggregator, service, chain.consumer_id.clone());

    let summary = gadget.bootstrap().await?;
    info!(
        consumer_id = %chain.consumer_id,
        providers = summary.providers,
        delegations = summary.delegations,
        "Seeded finality store from genesis"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_02_finality_store::InMemoryFinalityStore;

    const GENESIS: &str = r#"{
        "checkpoint": { "btc_confirmation_depth": 6, "checkpoint_finalization_timeout": 20 },
        "staking": { "covenant_quorum": 1 },
        "btc_tip_height": 500,
        "finality_providers": [
            { "btc_pk_hex": "fp1", "consumer_id": "consumer-1" },
            { "btc_pk_hex": "fp2", "consumer_id": "consumer-1" },
            { "btc_pk_hex": "other", "consumer_id": "consumer-2" }
        ],
        "delegations": [
            { "staking_tx_hash_hex": "d1", "fp_btc_pk_list": ["fp1"], "start_height": 100,
              "end_height": 1000, "total_sat": 50 },
            { "staking_tx_hash_hex": "d2", "fp_btc_pk_list": ["fp1", "fp2"], "start_height": 100,
              "end_height": 1000, "total_sat": 30 },
            { "staking_tx_hash_hex": "d3", "fp_btc_pk_list": ["other"], "start_height": 100,
              "end_height": 1000, "total_sat": 10 }
        ]
    }"#;

    #[tokio::test]
    async fn test_seed_only_tracks_configured_consumer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genesis.json");
        std::fs::write(&path, GENESIS).unwrap();

        let snapshot = GenesisSnapshot::load(&path).unwrap();
        let service = Arc::new(FinalityService::new(Arc::new(InMemoryFinalityStore::new())));
        let summary = seed_from_snapshot(snapshot, &ChainConfig::default(), service.clone())
            .await
            .unwrap();

        assert_eq!(summary.providers, 2);
        assert_eq!(summary.delegations, 2);
        let store = service.store();
        assert!(store.get_finality_provider("fp2").is_ok());
        assert!(store.get_finality_provider("other").is_err());
        assert!(store.get_delegation("d3").is_err());
    }

    #[test]
    fn test_malformed_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genesis.json");
        std::fs::write(&path, "{\"staking\": {}}").unwrap();
        assert!(matches!(
            GenesisSnapshot::load(&path),
            Err(GenesisError::Parse { .. })
        ));
        assert!(matches!(
            GenesisSnapshot::load(dir.path().join("missing.json")),
            Err(GenesisError::Read { .. })
        ));
    }
}
