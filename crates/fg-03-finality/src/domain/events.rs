//! How chain events mutate stored staking state.
//!
//! Every mutation goes through the caller's transaction, so an event either
//! lands completely or not at all.

use crate::error::{FinalityError, FinalityResult};
use fg_02_finality_store::StoreTransaction;
use shared_types::{ChainEvent, FinalityProvider};

/// What happened to an event handed to the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// State was updated and the event recorded
    Applied,
    /// The event key was already recorded; nothing changed
    AlreadyApplied,
}

/// Apply `event` to the state visible through `tx`.
///
/// Does not touch the applied-event log.
pub fn apply_chain_event<T: StoreTransaction>(tx: &mut T, event: &ChainEvent) -> FinalityResult<()> {
    match event {
        ChainEvent::NewFinalityProvider {
            btc_pk_hex,
            addr,
            consumer_id,
            commission,
            moniker,
        } => {
            // Re-registration refreshes metadata but keeps jail and slash status.
            let existing = tx.get_finality_provider(btc_pk_hex)?;
            tx.upsert_finality_provider(FinalityProvider {
                btc_pk_hex: btc_pk_hex.clone(),
                addr: addr.clone(),
                consumer_id: consumer_id.clone(),
                commission: commission.clone(),
                moniker: moniker.clone(),
                jailed: existing.as_ref().is_some_and(|fp| fp.jailed),
                slashed: existing.as_ref().is_some_and(|fp| fp.slashed),
            })?;
        }
        ChainEvent::BtcDelegationStateUpdate {
            staking_tx_hash_hex,
            new_state,
        } => {
            let mut del = tx.get_delegation(staking_tx_hash_hex)?.ok_or_else(|| {
                FinalityError::UnknownDelegation {
                    staking_tx_hash_hex: staking_tx_hash_hex.clone(),
                }
            })?;
            del.state = *new_state;
            tx.upsert_delegation(del)?;
        }
        ChainEvent::JailedFinalityProvider { btc_pk_hex } => {
            update_provider(tx, btc_pk_hex, |fp| fp.jailed = true)?;
        }
        ChainEvent::UnjailedFinalityProvider { btc_pk_hex } => {
            update_provider(tx, btc_pk_hex, |fp| fp.jailed = false)?;
        }
        ChainEvent::SelectiveSlashing { fp_btc_pk_hex, .. }
        | ChainEvent::SlashedFinalityProvider { fp_btc_pk_hex } => {
            // Slashed providers stay stored as tombstones.
            update_provider(tx, fp_btc_pk_hex, |fp| fp.slashed = true)?;
        }
    }
    Ok(())
}

fn update_provider<T, F>(tx: &mut T, btc_pk_hex: &str, mutate: F) -> FinalityResult<()>
where
    T: StoreTransaction,
    F: FnOnce(&mut FinalityProvider),
{
    let mut fp = tx.get_finality_provider(btc_pk_hex)?.ok_or_else(|| {
        FinalityError::UnknownFinalityProvider {
            btc_pk_hex: btc_pk_hex.to_string(),
        }
    })?;
    mutate(&mut fp);
    tx.upsert_finality_provider(fp)?;
    Ok(())
}
