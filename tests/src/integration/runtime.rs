//! # Runtime Lifecycle
//!
//! The service runtime over real sockets: configuration file to seeded
//! store to listeners, and teardown afterwards.

#[cfg(test)]
mod tests {
    use crate::integration::{delegation, rpc, TestServer, CONSUMER_ID};
    use fg_02_finality_store::{FinalityStore, InMemoryFinalityStore};
    use fg_03_finality::FinalityService;
    use fg_04_query_api::codes;
    use node_runtime::{seed_from_snapshot, GenesisSnapshot, NodeConfig, RuntimeState, ServiceRuntime};
    use serde_json::json;
    use shared_types::{Block, FinalityProvider};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn write_genesis(dir: &std::path::Path) -> std::path::PathBuf {
        let snapshot = GenesisSnapshot {
            checkpoint: fg_01_btc_staking::CheckpointParams {
                btc_confirmation_depth: 10,
                checkpoint_finalization_timeout: 10,
            },
            staking: fg_01_btc_staking::StakingParams { covenant_quorum: 2 },
            btc_tip_height: 500,
            finality_providers: vec![
                FinalityProvider::new("fp1", CONSUMER_ID),
                FinalityProvider::new("fp2", CONSUMER_ID),
            ],
            delegations: vec![delegation(1, &["fp1"], 60), delegation(2, &["fp2"], 40)],
        };
        let path = dir.join("genesis.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&snapshot).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_config_file_to_serving_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let genesis = write_genesis(dir.path());
        let config_path = dir.path().join("fg.json");
        std::fs::write(
            &config_path,
            json!({
                "server": { "listen_addrs": ["127.0.0.1:0", "127.0.0.1:0"], "max_batch_size": 2 },
                "chain": { "consumer_id": CONSUMER_ID, "genesis_file": genesis },
            })
            .to_string(),
        )
        .unwrap();

        let config = NodeConfig::from_file(&config_path).unwrap();
        config.validate().unwrap();

        let store = InMemoryFinalityStore::new();
        let service = Arc::new(FinalityService::new(Arc::new(store.clone())));
        let snapshot = GenesisSnapshot::load(config.chain.genesis_file.as_ref().unwrap()).unwrap();
        let summary = seed_from_snapshot(snapshot, &config.chain, service.clone())
            .await
            .unwrap();
        assert_eq!((summary.providers, summary.delegations), (2, 2));
        service.record_block(Block::new(1, "0x01", 100).finalized()).unwrap();

        let runtime = Arc::new(ServiceRuntime::new(config.server.clone(), service));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = {
            let runtime = runtime.clone();
            tokio::spawn(async move {
                runtime
                    .run_until_shutdown(async {
                        let _ = stop_rx.await;
                    })
                    .await
            })
        };

        let mut state = runtime.subscribe();
        tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == RuntimeState::Running))
            .await
            .unwrap()
            .unwrap();

        // Every listener serves the same store.
        let addrs = runtime.bound_addrs();
        assert_eq!(addrs.len(), 2);
        for addr in &addrs {
            let res = rpc(&format!("http://{addr}/"), "finality_isBlockFinalizedByHeight", json!([1])).await;
            assert_eq!(res["result"], json!(true));
        }

        // Batch limit comes from the config file.
        let batch = json!([
            {"jsonrpc": "2.0", "id": 1, "method": "finality_activatedTimestamp"},
            {"jsonrpc": "2.0", "id": 2, "method": "finality_activatedTimestamp"},
            {"jsonrpc": "2.0", "id": 3, "method": "finality_activatedTimestamp"},
        ]);
        let res: serde_json::Value = reqwest::Client::new()
            .post(format!("http://{}/", addrs[0]))
            .json(&batch)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(res["error"]["code"], json!(codes::LIMIT_EXCEEDED));

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(runtime.state(), RuntimeState::Stopped);
        assert!(store.is_closed());
    }

    #[tokio::test]
    async fn test_health_and_not_found_over_http() {
        let store = InMemoryFinalityStore::new();
        let server = TestServer::start(Arc::new(FinalityService::new(Arc::new(store.clone())))).await;

        let health: serde_json::Value = reqwest::get(format!("http://{}/health", server.addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], json!("healthy"));

        let res = rpc(&server.url(), "finality_latestFinalizedBlock", json!([])).await;
        assert_eq!(res["error"]["code"], json!(codes::RESOURCE_NOT_FOUND));
        let res = rpc(&server.url(), "finality_activatedTimestamp", json!([])).await;
        assert_eq!(res["error"]["code"], json!(codes::RESOURCE_NOT_FOUND));

        let addr = server.addr;
        server.stop().await.unwrap();
        assert!(store.is_closed());
        assert!(store.latest_finalized_block().is_err());
        assert!(reqwest::get(format!("http://{addr}/health")).await.is_err());
    }
}
