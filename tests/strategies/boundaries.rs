use std::time::Duration;

use stock_guard::{
    DecreaseStock, NamedLockExecutor, PessimisticLockExecutor, StockConfig, StockError, StockId,
    StockStore, Strategy, TransactionManager,
};

use crate::support::{init_tracing, seeded, ID};

#[test]
fn insufficient_stock_leaves_quantity_for_every_strategy() {
    init_tracing();
    for strategy in Strategy::ALL {
        let store = seeded(5);
        let executor = strategy.executor(store.clone(), &StockConfig::default());

        let err = executor.decrease(ID, 6).unwrap_err();
        assert_eq!(
            err,
            StockError::InsufficientStock {
                id: ID,
                requested: 6,
                available: 5
            },
            "{strategy}"
        );
        assert_eq!(store.read_plain(ID).unwrap().quantity(), 5, "{strategy}");

        // Exactly what is left can still be taken.
        assert_eq!(executor.decrease(ID, 5).unwrap().remaining, 0, "{strategy}");
    }
}

#[test]
fn missing_and_zero_requests_are_rejected_for_every_strategy() {
    for strategy in Strategy::ALL {
        let store = seeded(5);
        let executor = strategy.executor(store.clone(), &StockConfig::default());

        assert!(
            matches!(
                executor.decrease(StockId::new(99), 1),
                Err(StockError::NotFound { .. })
            ),
            "{strategy}"
        );
        assert!(
            matches!(
                executor.decrease(ID, 0),
                Err(StockError::InvalidQuantity { .. })
            ),
            "{strategy}"
        );
        assert_eq!(store.read_plain(ID).unwrap().quantity(), 5);
    }
}

#[test]
fn named_lock_release_is_idempotent() {
    init_tracing();
    let store = seeded(10);
    let executor = NamedLockExecutor::new(store.clone(), &StockConfig::default());
    executor.decrease(ID, 1).unwrap();

    let key = executor.lock_key(ID);
    let session = store.open_session();
    // Never acquired by this session.
    store.release_named_lock(session, &key).unwrap();

    assert!(store
        .acquire_named_lock(session, &key, Duration::from_millis(10))
        .unwrap());
    store.release_named_lock(session, &key).unwrap();
    store.release_named_lock(session, &key).unwrap();
    assert_eq!(store.named_lock_holder(&key).unwrap(), None);

    // The lock is still usable afterwards.
    assert_eq!(executor.decrease(ID, 1).unwrap().remaining, 8);
}

#[test]
fn pessimistic_decrement_rolls_back_with_its_caller() {
    let store = seeded(10);
    let config = StockConfig::default();
    let executor = PessimisticLockExecutor::new(store.clone(), &config);
    let manager = TransactionManager::new(store.clone(), &config);

    let mut outer = manager.begin();
    executor.decrease_in(Some(&mut outer), ID, 4).unwrap();
    outer.rollback();

    assert_eq!(store.read_plain(ID).unwrap().quantity(), 10);
}

#[test]
fn named_lock_decrement_survives_caller_rollback() {
    let store = seeded(10);
    let config = StockConfig::default();
    let executor = NamedLockExecutor::new(store.clone(), &config);
    let manager = TransactionManager::new(store.clone(), &config);

    let mut outer = manager.begin();
    executor.decrease_in(Some(&mut outer), ID, 4).unwrap();
    outer.rollback();

    assert_eq!(store.read_plain(ID).unwrap().quantity(), 6);
}

#[test]
fn executors_follow_json_config() {
    let config = StockConfig::from_json(
        r#"{ "named_lock_timeout": 20, "named_lock_prefix": "sku/" }"#,
    )
    .unwrap();
    let store = seeded(10);
    let executor = NamedLockExecutor::new(store.clone(), &config);
    assert_eq!(executor.lock_key(ID), "sku/1");

    let other = store.open_session();
    assert!(store
        .acquire_named_lock(other, "sku/1", Duration::from_millis(10))
        .unwrap());
    let err = executor.decrease(ID, 1).unwrap_err();
    assert_eq!(
        err,
        StockError::LockTimeout {
            key: "sku/1".into(),
            waited: Duration::from_millis(20)
        }
    );
}
