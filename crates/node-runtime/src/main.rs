//! # Finality Gadget Node
//!
//! Serves BTC-staking finality state for a consumer chain over JSON-RPC.
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber
//! 2. Load configuration (file from `FG_CONFIG`, then env overrides)
//! 3. Open the finality store (in-memory or RocksDB)
//! 4. Seed the store from the genesis snapshot, if configured
//! 5. Bind every query listener, wait until all are ready
//! 6. Serve until Ctrl+C, then tear down
//!
//! The node only serves what is in the store. It does not follow the
//! staking chain or vote on new blocks itself: block verdicts and the
//! activation record come from genesis seeding or from a process driving
//! `FinalityGadget::evaluate_block` and `FinalityGadget::sync_activation`
//! against the same store.

use std::sync::Arc;

use anyhow::{Context, Result};
use fg_02_finality_store::{FinalityStore, InMemoryFinalityStore};
use fg_03_finality::FinalityService;
use node_runtime::{
    logging, seed_from_snapshot, GenesisSnapshot, NodeConfig, ServiceRuntime, StorageBackend,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let config = NodeConfig::load().context("failed to load configuration")?;

    info!("===========================================");
    info!("  Finality Gadget v{}", env!("CARGO_PKG_VERSION"));
    info!("  Consumer: {}", config.chain.consumer_id);
    info!("  Storage:  {:?}", config.storage.backend);
    info!("===========================================");

    match config.storage.backend {
        StorageBackend::Memory => run(config, InMemoryFinalityStore::new()).await,
        StorageBackend::RocksDb => {
            let store = open_rocksdb(&config)?;
            run(config, store).await
        }
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(
    config: &NodeConfig,
) -> Result<fg_02_finality_store::KvFinalityStore<fg_02_finality_store::RocksDbStore>> {
    use fg_02_finality_store::{KvFinalityStore, RocksDbConfig, RocksDbStore};

    let rocks_config = RocksDbConfig {
        path: config.storage.data_dir.to_string_lossy().into_owned(),
        sync_writes: config.storage.sync_writes,
        ..Default::default()
    };
    let kv = RocksDbStore::open(rocks_config)
        .with_context(|| format!("failed to open RocksDB at {:?}", config.storage.data_dir))?;
    info!("Data Dir: {:?}", config.storage.data_dir);
    Ok(KvFinalityStore::new(kv))
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(_config: &NodeConfig) -> Result<InMemoryFinalityStore> {
    anyhow::bail!("RocksDB storage requires building with --features rocksdb")
}

async fn run<S: FinalityStore>(config: NodeConfig, store: S) -> Result<()> {
    let service = Arc::new(FinalityService::new(Arc::new(store)));

    if let Some(path) = &config.chain.genesis_file {
        let seeded = async {
            let snapshot = GenesisSnapshot::load(path)?;
            seed_from_snapshot(snapshot, &config.chain, service.clone()).await
        }
        .await;
        if let Err(e) = seeded {
            // Startup failed before any listener exists; release the store.
            if let Err(close_err) = service.store().close() {
                error!(error = %close_err, "Failed to close finality store");
            }
            return Err(e).context("failed to seed from genesis");
        }
    }

    let runtime = ServiceRuntime::new(config.server.clone(), service);
    runtime
        .run_until_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C"),
                Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
            }
        })
        .await?;

    Ok(())
}
