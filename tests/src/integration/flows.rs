//! # Finality Flows
//!
//! Staking chain -> power aggregation -> finality verdict -> store -> JSON-RPC.
//!
//! The same flow runs against both store implementations; the services
//! never change, only the backend handed to them.

#[cfg(test)]
mod tests {
    use crate::integration::{rpc, staking_chain, TestServer, CONSUMER_ID};
    use fg_01_btc_staking::adapters::InMemoryChainGateway;
    use fg_01_btc_staking::{PowerAggregator, NEVER_ACTIVATED};
    use fg_02_finality_store::{FinalityStore, InMemoryFinalityStore, InMemoryKVStore, KvFinalityStore};
    use fg_03_finality::{FinalityError, FinalityGadget, FinalityService};
    use fg_04_query_api::codes;
    use serde_json::json;
    use shared_types::Block;
    use std::sync::Arc;

    /// BTC block interval used to turn heights into timestamps.
    const BTC_BLOCK_SECS: u64 = 600;

    fn voters(fps: &[&str]) -> Vec<String> {
        fps.iter().map(|fp| fp.to_string()).collect()
    }

    fn gadget<S: FinalityStore>(
        gateway: Arc<InMemoryChainGateway>,
        store: S,
    ) -> FinalityGadget<InMemoryChainGateway, S> {
        let service = Arc::new(FinalityService::new(Arc::new(store)));
        let aggregator = PowerAggregator::new(gateway).with_max_concurrency(2);
        FinalityGadget::new(aggregator, service, CONSUMER_ID)
    }

    async fn finality_flow<S: FinalityStore>(store: S) {
        let gateway = Arc::new(staking_chain());
        let gadget = gadget(gateway.clone(), store);

        let summary = gadget.bootstrap().await.unwrap();
        assert_eq!(summary.providers, 3);
        assert_eq!(summary.delegations, 5);

        // Total 100, quorum 67.
        let v1 = gadget
            .evaluate_block(Block::new(1, "0x01", 1_000), 200, &voters(&["fp1", "fp3"]))
            .await
            .unwrap();
        assert!(v1.finalized);
        assert_eq!((v1.voted_power, v1.total_power), (70, 100));

        let v2 = gadget
            .evaluate_block(Block::new(2, "0x02", 1_010), 200, &voters(&["fp2", "fp3", "outsider"]))
            .await
            .unwrap();
        assert!(!v2.finalized);
        assert_eq!(v2.missing_power(), 17);

        let activated = gadget
            .sync_activation(|height| Ok(height * BTC_BLOCK_SECS))
            .await
            .unwrap();
        assert_eq!(activated, Some(110 * BTC_BLOCK_SECS));

        let server = TestServer::start(gadget.service().clone()).await;
        let url = server.url();

        let res = rpc(&url, "finality_isBlockFinalizedByHeight", json!([1])).await;
        assert_eq!(res["result"], json!(true));
        let res = rpc(&url, "finality_isBlockFinalizedByHash", json!(["0x02"])).await;
        assert_eq!(res["result"], json!(false));
        let res = rpc(&url, "finality_isBlockFinalizedByHeight", json!([3])).await;
        assert_eq!(res["error"]["code"], json!(codes::RESOURCE_NOT_FOUND));

        let res = rpc(&url, "finality_latestFinalizedBlock", json!([])).await;
        assert_eq!(res["result"]["height"], json!(1));
        assert_eq!(res["result"]["hash"], json!("0x01"));

        let res = rpc(&url, "finality_activatedTimestamp", json!([])).await;
        assert_eq!(res["result"], json!(110 * BTC_BLOCK_SECS));

        server.stop().await.unwrap();
        assert!(gadget.service().store().is_block_finalized_by_height(1).is_err());
    }

    #[tokio::test]
    async fn test_finality_flow_in_memory_store() {
        finality_flow(InMemoryFinalityStore::new()).await;
    }

    #[tokio::test]
    async fn test_finality_flow_kv_store() {
        finality_flow(KvFinalityStore::new(InMemoryKVStore::new())).await;
    }

    #[tokio::test]
    async fn test_late_vote_finalizes_previously_open_block() {
        let gadget = gadget(Arc::new(staking_chain()), InMemoryFinalityStore::new());
        let block = Block::new(7, "0x07", 2_000);

        let first = gadget
            .evaluate_block(block.clone(), 300, &voters(&["fp1"]))
            .await
            .unwrap();
        assert!(!first.finalized);

        let second = gadget
            .evaluate_block(block.clone(), 300, &voters(&["fp1", "fp2"]))
            .await
            .unwrap();
        assert!(second.finalized);

        // A later evaluation with fewer votes never un-finalizes the block.
        gadget
            .evaluate_block(block, 300, &voters(&["fp3"]))
            .await
            .unwrap();
        let store = gadget.service().store();
        assert!(store.is_block_finalized_by_height(7).unwrap());
        assert!(store.is_block_finalized_by_hash("0x07").unwrap());
    }

    #[tokio::test]
    async fn test_upstream_failure_persists_nothing() {
        let gateway = Arc::new(staking_chain());
        let gadget = gadget(gateway.clone(), InMemoryFinalityStore::new());

        gateway.fail_provider("fp2");
        let err = gadget
            .evaluate_block(Block::new(9, "0x09", 3_000), 200, &voters(&["fp1", "fp2"]))
            .await
            .unwrap_err();
        assert!(matches!(err, FinalityError::UpstreamUnavailable(_)));

        let server = TestServer::start(gadget.service().clone()).await;
        let res = rpc(&server.url(), "finality_isBlockFinalizedByHeight", json!([9])).await;
        assert_eq!(res["error"]["code"], json!(codes::RESOURCE_NOT_FOUND));

        gateway.heal_provider("fp2");
        let verdict = gadget
            .evaluate_block(Block::new(9, "0x09", 3_000), 200, &voters(&["fp1", "fp2"]))
            .await
            .unwrap();
        assert!(verdict.finalized);

        let res = rpc(&server.url(), "finality_isBlockFinalizedByHeight", json!([9])).await;
        assert_eq!(res["result"], json!(true));
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_activation_waits_for_confirmation_depth() {
        let gateway = Arc::new(staking_chain());
        gateway.set_tip(105);
        let gadget = gadget(gateway.clone(), InMemoryFinalityStore::new());

        assert_eq!(gadget.sync_activation(|h| Ok(h)).await.unwrap(), None);
        let aggregator = PowerAggregator::new(gateway.clone());
        let providers = aggregator.provider_keys(CONSUMER_ID).await.unwrap();
        assert_eq!(
            aggregator.earliest_activation_height(&providers).await.unwrap(),
            NEVER_ACTIVATED
        );
        assert!(gadget.service().store().activated_timestamp().is_err());

        gateway.set_tip(500);
        assert_eq!(gadget.sync_activation(|h| Ok(h)).await.unwrap(), Some(110));
    }
}
