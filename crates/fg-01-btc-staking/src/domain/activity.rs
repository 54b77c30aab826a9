//! Delegation activity
//!
//! Both functions here are pure: the outcome depends only on the delegation,
//! the height and the parameters passed in.

use super::params::ChainParams;
use shared_types::{BtcDelegation, BtcHeight};

/// Sentinel for "never activated". Never a real height.
pub const NEVER_ACTIVATED: BtcHeight = u64::MAX;

/// Whether `del` contributes voting power at BTC height `btc_height`.
///
/// All of the following must hold:
/// 1. no delegator unbonding signature is present
/// 2. `btc_height >= start_height + k`
/// 3. `btc_height + w <= end_height`
/// 4. covenant signatures >= `Q`
/// 5. covenant unbonding and unbonding-slashing signatures are both >= `Q`
///
/// Conditions 2-4 are also checked by the staking chain on admission, but the
/// height used here can differ from the admission height.
pub fn is_delegation_active(del: &BtcDelegation, btc_height: BtcHeight, params: &ChainParams) -> bool {
    if del.has_delegator_unbonding_sig() {
        return false;
    }

    // Overflowing sums mean the bound can never be met.
    match del.start_height.checked_add(params.confirmation_depth) {
        Some(confirmed_at) if btc_height >= confirmed_at => {}
        _ => return false,
    }
    match btc_height.checked_add(params.finalization_timeout) {
        Some(needed) if needed <= del.end_height => {}
        _ => return false,
    }

    let quorum = params.quorum();
    del.covenant_sig_count() >= quorum
        && del.covenant_unbonding_sig_count() >= quorum
        && del.covenant_slashing_sig_count() >= quorum
}

/// First BTC height at which `del` became active, given the current tip.
///
/// Returns [`NEVER_ACTIVATED`] if the staking tx is not yet `k`-deep at the
/// tip or the covenant quorum is missing. Unbonding is not consulted: a later
/// unbonding does not move the point at which the chain first had stake.
pub fn first_active_height(del: &BtcDelegation, tip_height: BtcHeight, params: &ChainParams) -> BtcHeight {
    let Some(candidate) = del.start_height.checked_add(params.confirmation_depth) else {
        return NEVER_ACTIVATED;
    };
    if tip_height < candidate || del.covenant_sig_count() < params.quorum() {
        return NEVER_ACTIVATED;
    }
    candidate
}
