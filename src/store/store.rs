use std::time::Duration;

use crate::error::StockError;
use crate::lock::SessionId;
use crate::stock::{StockId, StockRecord};

/// Storage for stock rows.
pub trait StockStore: Send + Sync {
    /// Exclusive hold on one row, released on drop.
    type RowLock: Send;

    /// Unsynchronized read. The copy carries no version and may already be
    /// stale when it is returned.
    fn read_plain(&self, id: StockId) -> Result<StockRecord, StockError>;

    /// Plain read that captures the stored version.
    fn read_versioned(&self, id: StockId) -> Result<StockRecord, StockError>;

    /// Take the exclusive row lock for `id`, waiting at most `timeout`.
    ///
    /// Callers serialize on the same id until the returned hold is dropped.
    /// An elapsed wait surfaces as [`StockError::LockTimeout`].
    fn lock_row(&self, id: StockId, timeout: Duration) -> Result<Self::RowLock, StockError>;

    /// Persist `records` all-or-nothing and return them with their new
    /// versions.
    ///
    /// A record that carries a version is only written if the stored version
    /// still equals it; otherwise nothing is written and
    /// [`StockError::VersionConflict`] is returned. Every successful write
    /// increments the stored version, so a row that appears twice in one
    /// batch is checked the second time against the version the first
    /// write produces.
    fn write_all(&self, records: &[StockRecord]) -> Result<Vec<StockRecord>, StockError>;

    /// Persist a single record. See [`StockStore::write_all`].
    fn write(&self, record: &StockRecord) -> Result<StockRecord, StockError> {
        let mut written = self.write_all(std::slice::from_ref(record))?;
        written
            .pop()
            .ok_or(StockError::NotFound { id: record.id() })
    }

    /// Allocate a session that can own named locks.
    fn open_session(&self) -> SessionId;

    /// Acquire the advisory lock `key` for `session`, waiting at most
    /// `timeout`. Returns `Ok(false)` when the wait elapses. Reentrant only
    /// for the owning session.
    fn acquire_named_lock(
        &self,
        session: SessionId,
        key: &str,
        timeout: Duration,
    ) -> Result<bool, StockError>;

    /// Release one hold of `key` by `session`. Releasing a lock that was
    /// never acquired, or releasing twice, is a no-op.
    fn release_named_lock(&self, session: SessionId, key: &str) -> Result<(), StockError>;

    /// Seed a new row at version 0. Fails if the id already exists.
    fn insert(&self, record: &StockRecord) -> Result<StockRecord, StockError>;

    /// Remove a row. Returns true if it existed.
    fn delete(&self, id: StockId) -> Result<bool, StockError>;

    /// Remove every row.
    fn clear(&self) -> Result<(), StockError>;
}
