//! Integration flows and the fixtures they share.

pub mod events;
pub mod flows;
pub mod runtime;

use fg_01_btc_staking::adapters::InMemoryChainGateway;
use fg_02_finality_store::FinalityStore;
use fg_03_finality::FinalityService;
use node_runtime::{RuntimeError, RuntimeState, ServerConfig, ServiceRuntime};
use shared_types::{BtcDelegation, FinalityProvider, UndelegationInfo};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Consumer chain every fixture registers its providers under.
pub const CONSUMER_ID: &str = "consumer-1";

/// Signatures from `n` distinct covenant members.
pub fn covenant_sigs(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("covenant-{i}")).collect()
}

/// A fully signed delegation over BTC heights `[100, 1000]`.
pub fn delegation(id: u64, fps: &[&str], sat: u64) -> BtcDelegation {
    BtcDelegation {
        staking_tx_hash_hex: format!("{id:064x}"),
        staker_btc_pk_hex: format!("staker-{id}"),
        fp_btc_pk_list: fps.iter().map(|fp| fp.to_string()).collect(),
        start_height: 100,
        end_height: 1_000,
        total_sat: sat,
        covenant_sigs: covenant_sigs(2),
        undelegation: Some(UndelegationInfo {
            delegator_unbonding_sig_hex: None,
            covenant_unbonding_sigs: covenant_sigs(2),
            covenant_slashing_sigs: covenant_sigs(2),
        }),
        ..Default::default()
    }
}

/// fp1: 50, fp2: 30, fp3: 20 for BTC heights in `[110, 990]`, with
/// `k = 10`, `w = 10`, `Q = 2`, tip 500 and two delegations per page.
pub fn staking_chain() -> InMemoryChainGateway {
    let gateway = InMemoryChainGateway::new()
        .with_page_size(2)
        .with_params(10, 10, 2)
        .with_tip(500);

    for fp in ["fp1", "fp2", "fp3"] {
        gateway.add_finality_provider(FinalityProvider::new(fp, CONSUMER_ID));
    }
    gateway.add_finality_provider(FinalityProvider::new("outsider", "consumer-2"));

    gateway.add_delegation(delegation(1, &["fp1"], 20));
    gateway.add_delegation(delegation(2, &["fp1"], 20));
    gateway.add_delegation(delegation(3, &["fp1"], 10));
    gateway.add_delegation(delegation(4, &["fp2"], 30));
    gateway.add_delegation(delegation(5, &["fp3"], 20));
    gateway.add_delegation(delegation(6, &["outsider"], 1_000));
    gateway
}

/// A [`ServiceRuntime`] serving on an ephemeral localhost port.
pub struct TestServer<S: FinalityStore> {
    pub runtime: Arc<ServiceRuntime<S>>,
    pub addr: SocketAddr,
    stop: watch::Sender<bool>,
    handle: JoinHandle<Result<(), RuntimeError>>,
}

impl<S: FinalityStore> TestServer<S> {
    pub async fn start(service: Arc<FinalityService<S>>) -> Self {
        let config = ServerConfig {
            listen_addrs: vec![SocketAddr::from(([127, 0, 0, 1], 0))],
            ..Default::default()
        };
        let runtime = Arc::new(ServiceRuntime::new(config, service));
        let (stop, mut stop_rx) = watch::channel(false);

        let handle = {
            let runtime = runtime.clone();
            tokio::spawn(async move {
                runtime
                    .run_until_shutdown(async move {
                        let _ = stop_rx.wait_for(|stopped| *stopped).await;
                    })
                    .await
            })
        };

        let mut state = runtime.subscribe();
        let _ = state.wait_for(|s| *s != RuntimeState::Created && *s != RuntimeState::Starting).await;
        assert_eq!(runtime.state(), RuntimeState::Running, "runtime failed to start");
        let addr = runtime.bound_addrs()[0];

        Self {
            runtime,
            addr,
            stop,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Trigger shutdown and wait for teardown to finish.
    pub async fn stop(self) -> Result<(), RuntimeError> {
        self.stop.send_replace(true);
        match self.handle.await {
            Ok(result) => result,
            Err(e) => panic!("runtime task panicked: {e}"),
        }
    }
}

/// POST one JSON-RPC call and return the decoded response object.
#[cfg(test)]
pub(crate) async fn rpc(url: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });
    reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}
