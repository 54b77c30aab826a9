//! Staking chain parameters
//!
//! Parameters can change across chain upgrades, so they are fetched for every
//! aggregation call and never cached across calls.

use serde::{Deserialize, Serialize};

/// BTC checkpoint parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointParams {
    /// `k`: depth a staking tx needs before it is considered confirmed
    pub btc_confirmation_depth: u64,
    /// `w`: minimum time-lock that must remain for a delegation to count
    pub checkpoint_finalization_timeout: u64,
}

/// BTC staking parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    /// `Q`: covenant signatures required for a delegation to count
    pub covenant_quorum: u32,
}

/// The `(k, w, Q)` triple the activity predicate is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainParams {
    pub confirmation_depth: u64,
    pub finalization_timeout: u64,
    pub covenant_quorum: u32,
}

impl ChainParams {
    pub fn new(confirmation_depth: u64, finalization_timeout: u64, covenant_quorum: u32) -> Self {
        Self {
            confirmation_depth,
            finalization_timeout,
            covenant_quorum,
        }
    }

    pub fn from_parts(checkpoint: CheckpointParams, staking: StakingParams) -> Self {
        Self {
            confirmation_depth: checkpoint.btc_confirmation_depth,
            finalization_timeout: checkpoint.checkpoint_finalization_timeout,
            covenant_quorum: staking.covenant_quorum,
        }
    }

    /// Covenant quorum as a signature count.
    pub fn quorum(&self) -> usize {
        self.covenant_quorum as usize
    }
}
