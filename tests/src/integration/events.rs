//! # Event Replay
//!
//! Chain events applied through the finality service against every store
//! backend: replay idempotence, all-or-nothing rollback and concurrent
//! delivery of the same event.

#[cfg(test)]
mod tests {
    use crate::integration::{delegation, CONSUMER_ID};
    use fg_02_finality_store::{
        FinalityStore, InMemoryFinalityStore, InMemoryKVStore, KvFinalityStore, StoreTransaction,
    };
    use fg_03_finality::{EventOutcome, FinalityError, FinalityService};
    use shared_types::{
        BtcDelegation, ChainEvent, DelegationState, EventKey, FinalityProvider, TxInfo,
    };
    use std::sync::Arc;

    fn service<S: FinalityStore>(store: S) -> FinalityService<S> {
        let service = FinalityService::new(Arc::new(store));
        service
            .seed_initial_state(
                vec![
                    FinalityProvider::new("fp1", CONSUMER_ID),
                    FinalityProvider::new("fp2", CONSUMER_ID),
                ],
                vec![delegation(1, &["fp1"], 50), delegation(2, &["fp2"], 30)],
            )
            .unwrap();
        service
    }

    fn stream() -> Vec<(TxInfo, u32, ChainEvent)> {
        let tx_a = TxInfo::new("aa", 10);
        let tx_b = TxInfo::new("bb", 11);
        vec![
            (
                tx_a.clone(),
                0,
                ChainEvent::NewFinalityProvider {
                    btc_pk_hex: "fp3".into(),
                    addr: "bbn1fp3".into(),
                    consumer_id: CONSUMER_ID.into(),
                    commission: "0.05".into(),
                    moniker: "third".into(),
                },
            ),
            (
                tx_a,
                1,
                ChainEvent::JailedFinalityProvider {
                    btc_pk_hex: "fp1".into(),
                },
            ),
            (
                tx_b.clone(),
                0,
                ChainEvent::BtcDelegationStateUpdate {
                    staking_tx_hash_hex: delegation(2, &[], 0).staking_tx_hash_hex,
                    new_state: DelegationState::Unbonded,
                },
            ),
            (
                tx_b,
                1,
                ChainEvent::SlashedFinalityProvider {
                    fp_btc_pk_hex: "fp2".into(),
                },
            ),
        ]
    }

    fn snapshot<S: FinalityStore>(service: &FinalityService<S>) -> (Vec<FinalityProvider>, Vec<BtcDelegation>) {
        let store = service.store();
        let fps = ["fp1", "fp2", "fp3"]
            .iter()
            .map(|fp| store.get_finality_provider(fp).unwrap())
            .collect();
        let dels = [1, 2]
            .iter()
            .map(|id| {
                store
                    .get_delegation(&delegation(*id, &[], 0).staking_tx_hash_hex)
                    .unwrap()
            })
            .collect();
        (fps, dels)
    }

    fn replay_is_idempotent<S: FinalityStore>(store: S) {
        let service = service(store);

        for (tx_info, idx, event) in stream() {
            assert_eq!(
                service.process_event(&tx_info, idx, event).unwrap(),
                EventOutcome::Applied
            );
        }
        let once = snapshot(&service);

        let (fps, dels) = &once;
        assert!(fps[0].jailed);
        assert!(fps[1].slashed);
        assert_eq!(fps[2].moniker, "third");
        assert_eq!(dels[1].state, DelegationState::Unbonded);

        for (tx_info, idx, event) in stream() {
            assert_eq!(
                service.process_event(&tx_info, idx, event).unwrap(),
                EventOutcome::AlreadyApplied
            );
        }
        assert_eq!(snapshot(&service), once);
    }

    fn failed_event_leaves_no_trace<S: FinalityStore>(store: S) {
        let service = service(store);
        let tx_info = TxInfo::new("cc", 12);
        let unknown = ChainEvent::BtcDelegationStateUpdate {
            staking_tx_hash_hex: "ff".repeat(32),
            new_state: DelegationState::Expired,
        };

        let err = service.process_event(&tx_info, 0, unknown.clone()).unwrap_err();
        assert!(matches!(err, FinalityError::UnknownDelegation { .. }));

        // Not recorded, so a retry is evaluated again rather than skipped.
        let tx = service.store().begin_tx().unwrap();
        assert!(!tx.event_applied(&EventKey::new("cc", 0)).unwrap());
        tx.rollback();
        assert!(service.process_event(&tx_info, 0, unknown).is_err());

        // Both effects of one transaction scope commit together or not at all.
        let mut tx = service.store().begin_tx().unwrap();
        let jail = ChainEvent::JailedFinalityProvider {
            btc_pk_hex: "fp2".into(),
        };
        let ghost = ChainEvent::SlashedFinalityProvider {
            fp_btc_pk_hex: "ghost".into(),
        };
        service.apply_event(&mut tx, &tx_info, 1, jail).unwrap();
        assert!(service.apply_event(&mut tx, &tx_info, 2, ghost).is_err());
        tx.rollback();

        assert!(!service.store().get_finality_provider("fp2").unwrap().jailed);
        let tx = service.store().begin_tx().unwrap();
        assert!(!tx.event_applied(&EventKey::new("cc", 1)).unwrap());
    }

    fn concurrent_delivery_applies_once<S: FinalityStore>(store: S) {
        let service = service(store);
        let tx_info = TxInfo::new("dd", 13);
        let event = ChainEvent::JailedFinalityProvider {
            btc_pk_hex: "fp1".into(),
        };

        let outcomes: Vec<EventOutcome> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let (service, tx_info, event) = (&service, &tx_info, event.clone());
                    scope.spawn(move || service.process_event(tx_info, 0, event).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let applied = outcomes
            .iter()
            .filter(|o| **o == EventOutcome::Applied)
            .count();
        assert_eq!(applied, 1);
        assert!(service.store().get_finality_provider("fp1").unwrap().jailed);
    }

    macro_rules! event_tests {
        ($module:ident, $store:expr) => {
            mod $module {
                use super::*;

                #[test]
                fn test_replay_is_idempotent() {
                    replay_is_idempotent($store);
                }

                #[test]
                fn test_failed_event_leaves_no_trace() {
                    failed_event_leaves_no_trace($store);
                }

                #[test]
                fn test_concurrent_delivery_applies_once() {
                    concurrent_delivery_applies_once($store);
                }
            }
        };
    }

    event_tests!(in_memory, InMemoryFinalityStore::new());
    event_tests!(kv, KvFinalityStore::new(InMemoryKVStore::new()));

    #[cfg(feature = "rocksdb")]
    mod rocksdb {
        use super::*;
        use fg_02_finality_store::{RocksDbConfig, RocksDbStore};

        fn with_store(test: impl FnOnce(KvFinalityStore<RocksDbStore>)) {
            let dir = tempfile::tempdir().unwrap();
            let config = RocksDbConfig::for_testing(dir.path().to_string_lossy());
            test(KvFinalityStore::new(RocksDbStore::open(config).unwrap()));
        }

        #[test]
        fn test_replay_is_idempotent() {
            with_store(replay_is_idempotent);
        }

        #[test]
        fn test_failed_event_leaves_no_trace() {
            with_store(failed_event_leaves_no_trace);
        }

        #[test]
        fn test_concurrent_delivery_applies_once() {
            with_store(concurrent_delivery_applies_once);
        }
    }
}
