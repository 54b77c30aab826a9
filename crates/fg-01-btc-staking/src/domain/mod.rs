//! Domain module for BTC staking power
//!
//! ## Core Modules
//! - params: confirmation depth, finalization timeout, covenant quorum
//! - activity: delegation activity predicate and first-active height

pub mod activity;
pub mod params;

pub use activity::{first_active_height, is_delegation_active, NEVER_ACTIVATED};
pub use params::{ChainParams, CheckpointParams, StakingParams};
