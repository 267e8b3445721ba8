//! InMemoryStockStore - HashMap-backed stock store for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Duration;

use super::StockStore;
use crate::config::StockConfig;
use crate::error::StockError;
use crate::lock::{
    InMemoryLock, InMemoryLockManager, InMemoryNamedLocks, LockError, LockGuard, LockManager,
    SessionId,
};
use crate::stock::{StockId, StockRecord};

/// Internal stored representation of a row.
struct StoredRow {
    bytes: Vec<u8>,
    version: u64,
}

/// In-memory stock store backed by a HashMap.
///
/// Rows are held `bitcode`-encoded so callers only ever get detached copies.
/// An optional simulated latency is paid after each read snapshot and before
/// each write is applied, which widens the read-modify-write window the same
/// way a network round trip to a database would.
///
/// Clone-friendly via Arc: clones share rows and locks.
#[derive(Clone)]
pub struct InMemoryStockStore {
    rows: Arc<RwLock<HashMap<StockId, StoredRow>>>,
    row_locks: Arc<InMemoryLockManager>,
    named_locks: Arc<InMemoryNamedLocks>,
    latency: Duration,
}

impl Default for InMemoryStockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStockStore {
    /// Create a new empty store with no simulated latency.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            row_locks: Arc::new(InMemoryLockManager::new()),
            named_locks: Arc::new(InMemoryNamedLocks::new()),
            latency: Duration::ZERO,
        }
    }

    pub fn from_config(config: &StockConfig) -> Self {
        Self::new().with_latency(config.store_latency)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of stored rows.
    pub fn len(&self) -> Result<usize, StockError> {
        Ok(self.read_rows()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StockError> {
        Ok(self.len()? == 0)
    }

    /// The session currently holding the named lock `key`, if any.
    pub fn named_lock_holder(&self, key: &str) -> Result<Option<SessionId>, StockError> {
        Ok(self.named_locks.holder(key)?)
    }

    fn pause(&self) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }

    fn row_key(id: StockId) -> String {
        format!("row:{}", id)
    }

    fn encode(record: &StockRecord) -> Result<Vec<u8>, StockError> {
        bitcode::serialize(&record.clone().with_version(None))
            .map_err(|e| StockError::Codec(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<StockRecord, StockError> {
        bitcode::deserialize(bytes).map_err(|e| StockError::Codec(e.to_string()))
    }

    fn read_rows(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<StockId, StoredRow>>, StockError> {
        self.rows
            .read()
            .map_err(|_| StockError::Lock(LockError::Poisoned("rows read".into())))
    }

    fn write_rows(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<StockId, StoredRow>>, StockError> {
        self.rows
            .write()
            .map_err(|_| StockError::Lock(LockError::Poisoned("rows write".into())))
    }

    fn snapshot(&self, id: StockId) -> Result<(StockRecord, u64), StockError> {
        let (record, version) = {
            let rows = self.read_rows()?;
            let stored = rows.get(&id).ok_or(StockError::NotFound { id })?;
            (Self::decode(&stored.bytes)?, stored.version)
        };
        self.pause();
        Ok((record, version))
    }
}

impl StockStore for InMemoryStockStore {
    type RowLock = LockGuard<InMemoryLock>;

    fn read_plain(&self, id: StockId) -> Result<StockRecord, StockError> {
        let (record, _) = self.snapshot(id)?;
        Ok(record)
    }

    fn read_versioned(&self, id: StockId) -> Result<StockRecord, StockError> {
        let (record, version) = self.snapshot(id)?;
        Ok(record.with_version(Some(version)))
    }

    fn lock_row(&self, id: StockId, timeout: Duration) -> Result<Self::RowLock, StockError> {
        let key = Self::row_key(id);
        let lock = self.row_locks.get_lock(&key)?;
        match LockGuard::acquire(lock, key.clone(), timeout)? {
            Some(guard) => Ok(guard),
            None => {
                tracing::warn!(stock_id = %id, ?timeout, "row lock wait timed out");
                Err(StockError::LockTimeout {
                    key,
                    waited: timeout,
                })
            }
        }
    }

    fn write_all(&self, records: &[StockRecord]) -> Result<Vec<StockRecord>, StockError> {
        let encoded = records
            .iter()
            .map(|record| Ok((record, Self::encode(record)?)))
            .collect::<Result<Vec<_>, StockError>>()?;

        self.pause();
        let mut rows = self.write_rows()?;

        // Validate everything before touching anything. A row written twice in
        // one batch is checked against the version its earlier write produces.
        let mut next: HashMap<StockId, u64> = HashMap::new();
        for record in records {
            let id = record.id();
            let stored = rows.get(&id).ok_or(StockError::NotFound { id })?;
            let current = next.get(&id).copied().unwrap_or(stored.version);
            if let Some(expected) = record.version() {
                if current != expected {
                    tracing::debug!(
                        stock_id = %id,
                        expected,
                        actual = current,
                        "conditional write rejected"
                    );
                    return Err(StockError::VersionConflict {
                        id,
                        expected,
                        actual: current,
                    });
                }
            }
            next.insert(id, current + 1);
        }

        let mut written = Vec::with_capacity(encoded.len());
        for (record, bytes) in encoded {
            let id = record.id();
            let stored = rows.get_mut(&id).ok_or(StockError::NotFound { id })?;
            stored.bytes = bytes;
            stored.version += 1;
            written.push(record.clone().with_version(Some(stored.version)));
        }

        Ok(written)
    }

    fn open_session(&self) -> SessionId {
        self.named_locks.open_session()
    }

    fn acquire_named_lock(
        &self,
        session: SessionId,
        key: &str,
        timeout: Duration,
    ) -> Result<bool, StockError> {
        let acquired = self.named_locks.acquire(session, key, timeout)?;
        if acquired {
            tracing::debug!(%session, key, "named lock acquired");
        } else {
            tracing::warn!(%session, key, ?timeout, "named lock wait timed out");
        }
        Ok(acquired)
    }

    fn release_named_lock(&self, session: SessionId, key: &str) -> Result<(), StockError> {
        if self.named_locks.release(session, key)? {
            tracing::debug!(%session, key, "named lock released");
        }
        Ok(())
    }

    fn insert(&self, record: &StockRecord) -> Result<StockRecord, StockError> {
        let bytes = Self::encode(record)?;
        let mut rows = self.write_rows()?;

        let id = record.id();
        if rows.contains_key(&id) {
            return Err(StockError::AlreadyExists { id });
        }
        rows.insert(id, StoredRow { bytes, version: 0 });

        Ok(record.clone().with_version(Some(0)))
    }

    fn delete(&self, id: StockId) -> Result<bool, StockError> {
        let mut rows = self.write_rows()?;
        Ok(rows.remove(&id).is_some())
    }

    fn clear(&self) -> Result<(), StockError> {
        self.write_rows()?.clear();
        Ok(())
    }
}
