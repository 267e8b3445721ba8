//! Shared fixtures for the strategy suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use stock_guard::{
    DecreaseStock, Decrement, InMemoryStockStore, SessionId, StockError, StockId, StockRecord,
    StockStore,
};
use tracing_subscriber::EnvFilter;

pub const ID: StockId = StockId::new(1);

/// Route `tracing` output to the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn seeded(quantity: u64) -> InMemoryStockStore {
    seeded_with_latency(quantity, Duration::ZERO)
}

pub fn seeded_with_latency(quantity: u64, latency: Duration) -> InMemoryStockStore {
    let store = InMemoryStockStore::new().with_latency(latency);
    store.insert(&StockRecord::new(ID, quantity)).unwrap();
    store
}

/// Run `calls` decrements of `delta` on `ID`, all released at once from a
/// barrier. Results come back in no particular order.
pub fn run_concurrently(
    executor: Arc<dyn DecreaseStock>,
    calls: usize,
    delta: u64,
) -> Vec<Result<Decrement, StockError>> {
    let barrier = Arc::new(Barrier::new(calls));
    let handles: Vec<_> = (0..calls)
        .map(|_| {
            let executor = Arc::clone(&executor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                executor.decrease(ID, delta)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().expect("decrement thread panicked"))
        .collect()
}

/// Counts how many callers hold a row lock or named lock at the same time,
/// and remembers the most ever seen.
#[derive(Clone, Default)]
pub struct Overlap {
    active: Arc<AtomicUsize>,
    max: Arc<AtomicUsize>,
}

impl Overlap {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

/// Row hold that reports to an [`Overlap`] while alive.
pub struct ProbedRow<L> {
    _inner: L,
    overlap: Overlap,
}

impl<L> Drop for ProbedRow<L> {
    fn drop(&mut self) {
        self.overlap.exit();
    }
}

/// In-memory store that records lock overlap.
#[derive(Clone)]
pub struct ProbeStore {
    inner: InMemoryStockStore,
    rows: Overlap,
    named: Overlap,
}

impl ProbeStore {
    pub fn new(inner: InMemoryStockStore) -> Self {
        ProbeStore {
            inner,
            rows: Overlap::default(),
            named: Overlap::default(),
        }
    }

    pub fn inner(&self) -> &InMemoryStockStore {
        &self.inner
    }

    pub fn max_row_holders(&self) -> usize {
        self.rows.max()
    }

    pub fn max_named_holders(&self) -> usize {
        self.named.max()
    }
}

impl StockStore for ProbeStore {
    type RowLock = ProbedRow<<InMemoryStockStore as StockStore>::RowLock>;

    fn read_plain(&self, id: StockId) -> Result<StockRecord, StockError> {
        self.inner.read_plain(id)
    }

    fn read_versioned(&self, id: StockId) -> Result<StockRecord, StockError> {
        self.inner.read_versioned(id)
    }

    fn lock_row(&self, id: StockId, timeout: Duration) -> Result<Self::RowLock, StockError> {
        let inner = self.inner.lock_row(id, timeout)?;
        self.rows.enter();
        Ok(ProbedRow {
            _inner: inner,
            overlap: self.rows.clone(),
        })
    }

    fn write_all(&self, records: &[StockRecord]) -> Result<Vec<StockRecord>, StockError> {
        self.inner.write_all(records)
    }

    fn open_session(&self) -> SessionId {
        self.inner.open_session()
    }

    fn acquire_named_lock(
        &self,
        session: SessionId,
        key: &str,
        timeout: Duration,
    ) -> Result<bool, StockError> {
        let acquired = self.inner.acquire_named_lock(session, key, timeout)?;
        if acquired {
            self.named.enter();
        }
        Ok(acquired)
    }

    fn release_named_lock(&self, session: SessionId, key: &str) -> Result<(), StockError> {
        // Count the exit before the lock is visible as free to waiters.
        let held = self.inner.named_lock_holder(key)? == Some(session);
        if held {
            self.named.exit();
        }
        self.inner.release_named_lock(session, key)
    }

    fn insert(&self, record: &StockRecord) -> Result<StockRecord, StockError> {
        self.inner.insert(record)
    }

    fn delete(&self, id: StockId) -> Result<bool, StockError> {
        self.inner.delete(id)
    }

    fn clear(&self) -> Result<(), StockError> {
        self.inner.clear()
    }
}
