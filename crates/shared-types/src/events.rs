//! # Chain Events
//!
//! Occurrences on the staking chain that mutate indexed state. Every event
//! is identified by the transaction it came from and its index inside that
//! transaction; that pair is the idempotency key.

use crate::entities::{DelegationState, FpBtcPkHex};
use serde::{Deserialize, Serialize};

/// Transaction an event was emitted by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TxInfo {
    /// Transaction hash, hex encoded.
    pub tx_hash: String,
    /// Staking-chain height the transaction was included at.
    pub height: u64,
}

impl TxInfo {
    pub fn new(tx_hash: impl Into<String>, height: u64) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            height,
        }
    }
}

/// Natural idempotency key of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub tx_hash: String,
    pub event_index: u32,
}

impl EventKey {
    pub fn new(tx_hash: impl Into<String>, event_index: u32) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            event_index,
        }
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.event_index)
    }
}

/// Typed chain-level occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    /// A finality provider registered.
    NewFinalityProvider {
        btc_pk_hex: FpBtcPkHex,
        addr: String,
        consumer_id: String,
        commission: String,
        moniker: String,
    },
    /// A delegation moved to a new lifecycle state.
    BtcDelegationStateUpdate {
        staking_tx_hash_hex: String,
        new_state: DelegationState,
    },
    /// A finality provider was jailed for missing votes.
    JailedFinalityProvider { btc_pk_hex: FpBtcPkHex },
    /// A finality provider was released from jail.
    UnjailedFinalityProvider { btc_pk_hex: FpBtcPkHex },
    /// A finality provider's key leaked through selective slashing.
    SelectiveSlashing {
        fp_btc_pk_hex: FpBtcPkHex,
        staking_tx_hash_hex: String,
    },
    /// A finality provider was slashed for double signing.
    SlashedFinalityProvider { fp_btc_pk_hex: FpBtcPkHex },
}

impl ChainEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ChainEvent::NewFinalityProvider { .. } => "new_finality_provider",
            ChainEvent::BtcDelegationStateUpdate { .. } => "btc_delegation_state_update",
            ChainEvent::JailedFinalityProvider { .. } => "jailed_finality_provider",
            ChainEvent::UnjailedFinalityProvider { .. } => "unjailed_finality_provider",
            ChainEvent::SelectiveSlashing { .. } => "selective_slashing",
            ChainEvent::SlashedFinalityProvider { .. } => "slashed_finality_provider",
        }
    }
}

/// Entry of the append-only applied-event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub tx_info: TxInfo,
    pub event_index: u32,
    pub event: ChainEvent,
}

impl EventRecord {
    pub fn key(&self) -> EventKey {
        EventKey::new(self.tx_info.tx_hash.clone(), self.event_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_key_ordering() {
        let a = EventKey::new("aa", 1);
        let b = EventKey::new("aa", 2);
        let c = EventKey::new("ab", 0);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "aa#1");
    }

    #[test]
    fn test_event_record_bincode() {
        let record = EventRecord {
            tx_info: TxInfo::new("ff", 10),
            event_index: 3,
            event: ChainEvent::BtcDelegationStateUpdate {
                staking_tx_hash_hex: "01".into(),
                new_state: DelegationState::Unbonded,
            },
        };
        let bytes = bincode::serialize(&record).unwrap();
        let decoded: EventRecord = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.key(), EventKey::new("ff", 3));
    }
}
