//! In-memory Chain Query Gateway
//!
//! Serves providers and delegations from memory with real cursor-based
//! pagination, so page-boundary behavior can be exercised without a chain.

use crate::domain::{CheckpointParams, StakingParams};
use crate::error::{GatewayError, GatewayResult};
use crate::ports::outbound::{ChainQueryGateway, Page, PageKey};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{BtcDelegation, BtcHeight, FinalityProvider};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default page size, matching the staking chain's default query limit.
const DEFAULT_PAGE_SIZE: usize = 100;

struct GatewayState {
    /// consumer_id -> providers, in registration order
    providers: BTreeMap<String, Vec<FinalityProvider>>,
    /// fp pk -> delegations, in insertion order
    delegations: HashMap<String, Vec<BtcDelegation>>,
    checkpoint: CheckpointParams,
    staking: StakingParams,
    tip_height: BtcHeight,
    /// Providers whose delegation queries fail
    failing: HashSet<String>,
    /// Fail every call
    unavailable: bool,
}

/// In-memory gateway for testing.
pub struct InMemoryChainGateway {
    state: RwLock<GatewayState>,
    page_size: usize,
    delegation_page_fetches: AtomicUsize,
    params_fetches: AtomicUsize,
}

impl InMemoryChainGateway {
    /// Create an empty gateway with `k = 6`, `w = 20`, `Q = 1` and tip 0.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GatewayState {
                providers: BTreeMap::new(),
                delegations: HashMap::new(),
                checkpoint: CheckpointParams {
                    btc_confirmation_depth: 6,
                    checkpoint_finalization_timeout: 20,
                },
                staking: StakingParams { covenant_quorum: 1 },
                tip_height: 0,
                failing: HashSet::new(),
                unavailable: false,
            }),
            page_size: DEFAULT_PAGE_SIZE,
            delegation_page_fetches: AtomicUsize::new(0),
            params_fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_params(self, k: u64, w: u64, quorum: u32) -> Self {
        self.set_params(k, w, quorum);
        self
    }

    pub fn with_tip(self, tip_height: BtcHeight) -> Self {
        self.set_tip(tip_height);
        self
    }

    pub fn set_params(&self, k: u64, w: u64, quorum: u32) {
        let mut state = self.state.write();
        state.checkpoint = CheckpointParams {
            btc_confirmation_depth: k,
            checkpoint_finalization_timeout: w,
        };
        state.staking = StakingParams {
            covenant_quorum: quorum,
        };
    }

    pub fn set_tip(&self, tip_height: BtcHeight) {
        self.state.write().tip_height = tip_height;
    }

    pub fn add_finality_provider(&self, fp: FinalityProvider) {
        self.state
            .write()
            .providers
            .entry(fp.consumer_id.clone())
            .or_default()
            .push(fp);
    }

    /// Register a delegation under every provider it backs.
    pub fn add_delegation(&self, del: BtcDelegation) {
        let mut state = self.state.write();
        for fp in &del.fp_btc_pk_list {
            state
                .delegations
                .entry(fp.clone())
                .or_default()
                .push(del.clone());
        }
    }

    /// Make every delegation query for `fp_btc_pk_hex` fail.
    pub fn fail_provider(&self, fp_btc_pk_hex: &str) {
        self.state.write().failing.insert(fp_btc_pk_hex.to_string());
    }

    pub fn heal_provider(&self, fp_btc_pk_hex: &str) {
        self.state.write().failing.remove(fp_btc_pk_hex);
    }

    /// Make every call fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unavailable = unavailable;
    }

    /// Number of delegation pages served so far.
    pub fn delegation_page_fetches(&self) -> usize {
        self.delegation_page_fetches.load(Ordering::SeqCst)
    }

    /// Number of parameter queries served so far.
    pub fn params_fetches(&self) -> usize {
        self.params_fetches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> GatewayResult<()> {
        if self.state.read().unavailable {
            return Err(GatewayError::unavailable("staking chain unreachable"));
        }
        Ok(())
    }

    fn page_of<T: Clone>(&self, items: &[T], cursor: Option<PageKey>) -> GatewayResult<Page<T>> {
        let offset = match cursor {
            None => 0,
            Some(key) => decode_offset(&key)?,
        };
        let start = offset.min(items.len());
        let end = (start + self.page_size).min(items.len());
        let page = items[start..end].to_vec();

        if end < items.len() {
            Ok(Page::with_next(page, encode_offset(end)))
        } else {
            Ok(Page::last(page))
        }
    }
}

impl Default for InMemoryChainGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_offset(offset: usize) -> PageKey {
    (offset as u64).to_be_bytes().to_vec()
}

fn decode_offset(key: &[u8]) -> GatewayResult<usize> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| GatewayError::InvalidResponse {
        reason: format!("malformed page key of {} bytes", key.len()),
    })?;
    Ok(u64::from_be_bytes(bytes) as usize)
}

#[async_trait]
impl ChainQueryGateway for InMemoryChainGateway {
    async fn list_finality_providers(
        &self,
        consumer_id: &str,
        cursor: Option<PageKey>,
    ) -> GatewayResult<Page<FinalityProvider>> {
        self.check_available()?;
        let state = self.state.read();
        let providers = state
            .providers
            .get(consumer_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.page_of(providers, cursor)
    }

    async fn list_delegations(
        &self,
        fp_btc_pk_hex: &str,
        cursor: Option<PageKey>,
    ) -> GatewayResult<Page<BtcDelegation>> {
        self.check_available()?;
        self.delegation_page_fetches.fetch_add(1, Ordering::SeqCst);

        let state = self.state.read();
        if state.failing.contains(fp_btc_pk_hex) {
            return Err(GatewayError::unavailable(format!(
                "delegations query failed for {fp_btc_pk_hex}"
            )));
        }
        let delegations = state
            .delegations
            .get(fp_btc_pk_hex)
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.page_of(delegations, cursor)
    }

    async fn get_delegation(&self, staking_tx_hash_hex: &str) -> GatewayResult<Option<BtcDelegation>> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state
            .delegations
            .values()
            .flatten()
            .find(|del| del.staking_tx_hash_hex == staking_tx_hash_hex)
            .cloned())
    }

    async fn checkpoint_params(&self) -> GatewayResult<CheckpointParams> {
        self.check_available()?;
        self.params_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.read().checkpoint)
    }

    async fn staking_params(&self) -> GatewayResult<StakingParams> {
        self.check_available()?;
        Ok(self.state.read().staking)
    }

    async fn btc_tip_height(&self) -> GatewayResult<BtcHeight> {
        self.check_available()?;
        Ok(self.state.read().tip_height)
    }
}
