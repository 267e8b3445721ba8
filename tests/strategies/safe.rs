use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use stock_guard::{
    DecreaseStock, Decrement, NamedLockExecutor, OptimisticLockExecutor, PessimisticLockExecutor,
    StockConfig, StockError, StockStore, Strategy,
};

use crate::support::{
    init_tracing, run_concurrently, seeded, seeded_with_latency, ProbeStore, ID,
};

const LATENCY: Duration = Duration::from_millis(1);

fn config() -> StockConfig {
    StockConfig::default().with_optimistic_backoff(Duration::from_millis(1))
}

/// 100 callers each take 1 from 100: every call succeeds, each sees a
/// distinct remaining quantity, and nothing is left.
fn assert_exact(results: &[Result<Decrement, StockError>], store: &impl StockStore) {
    let remaining: BTreeSet<u64> = results
        .iter()
        .map(|result| result.as_ref().expect("decrement failed").remaining)
        .collect();
    assert_eq!(remaining, (0..100).collect::<BTreeSet<_>>());
    assert_eq!(store.read_plain(ID).unwrap().quantity(), 0);
}

#[test]
fn process_mutex_is_exact() {
    init_tracing();
    let store = seeded_with_latency(100, LATENCY);
    let executor: Arc<dyn DecreaseStock> =
        Arc::from(Strategy::ProcessMutex.executor(store.clone(), &config()));

    let results = run_concurrently(executor, 100, 1);
    assert_exact(&results, &store);
}

#[test]
fn pessimistic_lock_is_exact_and_never_overlaps() {
    init_tracing();
    let store = ProbeStore::new(seeded_with_latency(100, LATENCY));
    let executor = Arc::new(PessimisticLockExecutor::new(store.clone(), &config()));

    let results = run_concurrently(executor, 100, 1);
    assert_exact(&results, &store);
    assert_eq!(store.max_row_holders(), 1);
}

#[test]
fn named_lock_is_exact_and_never_overlaps() {
    init_tracing();
    let store = ProbeStore::new(seeded_with_latency(100, LATENCY));
    let executor = Arc::new(NamedLockExecutor::new(store.clone(), &config()));

    let results = run_concurrently(executor, 100, 1);
    assert_exact(&results, &store);
    assert_eq!(store.max_named_holders(), 1);
    assert_eq!(store.inner().named_lock_holder("stock:1").unwrap(), None);
}

#[test]
fn optimistic_lock_is_exact_and_versions_advance() {
    init_tracing();
    let store = seeded_with_latency(100, LATENCY);
    let executor = Arc::new(OptimisticLockExecutor::new(store.clone(), &config()));

    let results = run_concurrently(executor, 100, 1);
    assert_exact(&results, &store);

    let mut versions = BTreeSet::new();
    for decrement in results.iter().flatten() {
        let read = decrement.read_version.expect("optimistic reads carry a version");
        let committed = decrement.version.expect("committed version");
        assert!(committed > read);
        versions.insert(committed);
    }
    // One successful commit per version.
    assert_eq!(versions, (1..=100).collect::<BTreeSet<_>>());
    assert!(results.iter().flatten().any(|d| d.attempts > 1));
}

#[test]
fn optimistic_callers_beyond_stock_get_insufficient_stock() {
    init_tracing();
    let store = seeded(20);
    let executor = Arc::new(OptimisticLockExecutor::new(store.clone(), &config()));

    let results = run_concurrently(executor, 40, 1);
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(StockError::InsufficientStock { .. })))
        .count();

    assert_eq!(succeeded, 20);
    assert_eq!(refused, 20);
    assert_eq!(store.read_plain(ID).unwrap().quantity(), 0);
}

#[test]
fn larger_decrements_total_exactly() {
    init_tracing();
    for strategy in Strategy::ALL.into_iter().filter(|s| s.is_safe()) {
        let store = seeded(100);
        let executor: Arc<dyn DecreaseStock> =
            Arc::from(strategy.executor(store.clone(), &config()));

        let results = run_concurrently(executor, 10, 7);
        assert!(results.iter().all(Result::is_ok), "{strategy} failed");
        assert_eq!(store.read_plain(ID).unwrap().quantity(), 30, "{strategy}");
    }
}
