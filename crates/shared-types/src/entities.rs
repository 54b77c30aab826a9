//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **BTC Staking**: `FinalityProvider`, `BtcDelegation`, `UndelegationInfo`
//! - **Consumer Chain**: `Block`

use serde::{Deserialize, Serialize};

/// Height in the Bitcoin header chain.
pub type BtcHeight = u64;

/// Hex-encoded BIP-340 public key of a finality provider.
pub type FpBtcPkHex = String;

// =============================================================================
// CLUSTER A: BTC STAKING
// =============================================================================

/// A finality provider registered for a consumer chain.
///
/// Identified by its BTC public key. There is intentionally no `power` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FinalityProvider {
    /// BIP-340 public key, hex encoded.
    pub btc_pk_hex: FpBtcPkHex,
    /// Babylon address that registered the provider.
    pub addr: String,
    /// Consumer chain this provider votes for.
    pub consumer_id: String,
    /// Commission rate as a decimal string.
    pub commission: String,
    /// Human readable name.
    pub moniker: String,
    /// Whether the provider is currently jailed.
    pub jailed: bool,
    /// Whether the provider has been slashed. Slashed providers are kept.
    pub slashed: bool,
}

impl FinalityProvider {
    pub fn new(btc_pk_hex: impl Into<String>, consumer_id: impl Into<String>) -> Self {
        Self {
            btc_pk_hex: btc_pk_hex.into(),
            consumer_id: consumer_id.into(),
            ..Default::default()
        }
    }
}

/// Lifecycle state of a BTC delegation as reported by the staking chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DelegationState {
    /// Waiting for covenant signatures.
    #[default]
    Pending,
    /// Covenant quorum reached, staking tx not yet included.
    Verified,
    /// Has voting power.
    Active,
    /// Unbonded early by the staker.
    Unbonded,
    /// Time-lock expired.
    Expired,
}

impl std::fmt::Display for DelegationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DelegationState::Pending => "PENDING",
            DelegationState::Verified => "VERIFIED",
            DelegationState::Active => "ACTIVE",
            DelegationState::Unbonded => "UNBONDED",
            DelegationState::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Unbonding sub-record of a delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UndelegationInfo {
    /// Delegator's signature on the unbonding tx. Presence means the staker
    /// asked to unbond.
    pub delegator_unbonding_sig_hex: Option<String>,
    /// Covenant signatures on the unbonding tx (signer pk hex).
    pub covenant_unbonding_sigs: Vec<String>,
    /// Covenant adaptor signatures on the unbonding slashing tx (signer pk hex).
    pub covenant_slashing_sigs: Vec<String>,
}

impl UndelegationInfo {
    pub fn has_delegator_unbonding_sig(&self) -> bool {
        self.delegator_unbonding_sig_hex
            .as_deref()
            .is_some_and(|sig| !sig.is_empty())
    }
}

/// One staking commitment of BTC to one or more finality providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BtcDelegation {
    /// Hash of the staking transaction, hex encoded. Natural key.
    pub staking_tx_hash_hex: String,
    /// BTC public key of the staker.
    pub staker_btc_pk_hex: String,
    /// Finality providers this delegation backs.
    pub fp_btc_pk_list: Vec<FpBtcPkHex>,
    /// Start of the staking time-lock.
    pub start_height: BtcHeight,
    /// End of the staking time-lock.
    pub end_height: BtcHeight,
    /// Staked amount in satoshi.
    pub total_sat: u64,
    /// Covenant signatures on the slashing tx (signer pk hex).
    pub covenant_sigs: Vec<String>,
    /// Unbonding sub-record. Absent on malformed responses.
    pub undelegation: Option<UndelegationInfo>,
    /// Last state reported by the staking chain.
    pub state: DelegationState,
}

impl BtcDelegation {
    pub fn has_delegator_unbonding_sig(&self) -> bool {
        self.undelegation
            .as_ref()
            .is_some_and(UndelegationInfo::has_delegator_unbonding_sig)
    }

    pub fn covenant_sig_count(&self) -> usize {
        self.covenant_sigs.len()
    }

    pub fn covenant_unbonding_sig_count(&self) -> usize {
        self.undelegation
            .as_ref()
            .map_or(0, |ud| ud.covenant_unbonding_sigs.len())
    }

    pub fn covenant_slashing_sig_count(&self) -> usize {
        self.undelegation
            .as_ref()
            .map_or(0, |ud| ud.covenant_slashing_sigs.len())
    }

    /// Check whether this delegation backs the given finality provider.
    pub fn delegates_to(&self, fp_btc_pk_hex: &str) -> bool {
        self.fp_btc_pk_list.iter().any(|pk| pk == fp_btc_pk_hex)
    }
}

// =============================================================================
// CLUSTER B: CONSUMER CHAIN
// =============================================================================

/// A consumer-chain block and its finality verdict.
///
/// Height is the natural key, the hash a secondary lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub height: u64,
    /// Block hash, hex encoded.
    pub hash: String,
    /// Block timestamp in unix seconds.
    pub timestamp: u64,
    pub finalized: bool,
}

impl Block {
    pub fn new(height: u64, hash: impl Into<String>, timestamp: u64) -> Self {
        Self {
            height,
            hash: hash.into(),
            timestamp,
            finalized: false,
        }
    }

    pub fn finalized(mut self) -> Self {
        self.finalized = true;
        self
    }
}
