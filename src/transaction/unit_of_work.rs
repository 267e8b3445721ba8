use std::mem;
use std::time::Duration;

use crate::error::StockError;
use crate::lock::SessionId;
use crate::stock::{StockId, StockRecord};
use crate::store::StockStore;

/// One unit of work against a [`StockStore`].
///
/// - Writes are buffered and reach the store only at [`Transaction::commit`],
///   so a version conflict is observed when the unit of work ends.
/// - Row locks taken by [`Transaction::read_for_update`] are held until the
///   transaction commits, rolls back or is dropped.
/// - Dropping without committing rolls back.
pub struct Transaction<S: StockStore> {
    id: u64,
    session: SessionId,
    store: S,
    row_lock_timeout: Duration,
    row_locks: Vec<(StockId, S::RowLock)>,
    pending: Vec<StockRecord>,
    finished: bool,
}

impl<S: StockStore> Transaction<S> {
    pub(crate) fn new(id: u64, store: S, row_lock_timeout: Duration) -> Self {
        let session = store.open_session();
        Transaction {
            id,
            session,
            store,
            row_lock_timeout,
            row_locks: Vec::new(),
            pending: Vec::new(),
            finished: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The store session this transaction runs on. Named locks taken with it
    /// belong to this transaction's connection.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Plain read; sees this transaction's own buffered writes.
    pub fn read(&self, id: StockId) -> Result<StockRecord, StockError> {
        match self.buffered(id) {
            Some(record) => Ok(record.clone()),
            None => self.store.read_plain(id),
        }
    }

    /// Versioned read; sees this transaction's own buffered writes.
    pub fn read_versioned(&self, id: StockId) -> Result<StockRecord, StockError> {
        match self.buffered(id) {
            Some(record) => Ok(record.clone()),
            None => self.store.read_versioned(id),
        }
    }

    /// Lock the row for the rest of this transaction, then read it.
    pub fn read_for_update(&mut self, id: StockId) -> Result<StockRecord, StockError> {
        if !self.row_locks.iter().any(|(locked, _)| *locked == id) {
            let hold = self.store.lock_row(id, self.row_lock_timeout)?;
            tracing::trace!(tx = self.id, stock_id = %id, "row locked");
            self.row_locks.push((id, hold));
        }
        self.read(id)
    }

    /// Buffer a write. A later write of the same id replaces the earlier one.
    pub fn write(&mut self, record: StockRecord) {
        match self.pending.iter_mut().find(|p| p.id() == record.id()) {
            Some(existing) => *existing = record,
            None => self.pending.push(record),
        }
    }

    /// Apply buffered writes, then release row locks.
    ///
    /// Returns the written records with their new versions. On error nothing
    /// was written and the transaction is rolled back.
    pub fn commit(mut self) -> Result<Vec<StockRecord>, StockError> {
        self.finished = true;
        let pending = mem::take(&mut self.pending);
        let result = if pending.is_empty() {
            Ok(Vec::new())
        } else {
            self.store.write_all(&pending)
        };
        self.row_locks.clear();

        match &result {
            Ok(written) => tracing::debug!(tx = self.id, writes = written.len(), "committed"),
            Err(e) => tracing::debug!(tx = self.id, error = %e, "commit rejected, rolled back"),
        }
        result
    }

    /// Discard buffered writes and release row locks.
    pub fn rollback(mut self) {
        self.finished = true;
        self.pending.clear();
        self.row_locks.clear();
        tracing::debug!(tx = self.id, "rolled back");
    }

    fn buffered(&self, id: StockId) -> Option<&StockRecord> {
        self.pending.iter().find(|p| p.id() == id)
    }
}

impl<S: StockStore> Drop for Transaction<S> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                tx = self.id,
                discarded = self.pending.len(),
                "dropped without commit, rolled back"
            );
        }
    }
}
