use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::Transaction;
use crate::config::StockConfig;
use crate::error::StockError;
use crate::stock::{StockId, StockRecord};
use crate::store::StockStore;

/// How a unit of work relates to a transaction the caller may already hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Join the caller's transaction when there is one; its commit settles
    /// the work. Otherwise open and commit a new one.
    Required,
    /// Always open a new, independent transaction and commit it before
    /// returning, regardless of any caller transaction.
    RequiresNew,
}

/// Result of a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub value: T,
    /// Records written by the commit, with their new versions. Empty when the
    /// work joined a caller's transaction and has not been committed yet.
    pub records: Vec<StockRecord>,
}

impl<T> Committed<T> {
    /// The version `id` was committed at, if this unit of work committed it.
    pub fn version_of(&self, id: StockId) -> Option<u64> {
        self.records
            .iter()
            .find(|r| r.id() == id)
            .and_then(|r| r.version())
    }
}

/// Opens transactions against a store.
#[derive(Clone)]
pub struct TransactionManager<S> {
    store: S,
    row_lock_timeout: Duration,
    next_id: Arc<AtomicU64>,
}

impl<S: StockStore + Clone> TransactionManager<S> {
    pub fn new(store: S, config: &StockConfig) -> Self {
        TransactionManager {
            store,
            row_lock_timeout: config.row_lock_timeout,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn begin(&self) -> Transaction<S> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(tx = id, "begin");
        Transaction::new(id, self.store.clone(), self.row_lock_timeout)
    }

    /// Run `work` in a new transaction: commit if it succeeds, roll back if it
    /// fails. A rejected commit is returned as the error.
    pub fn execute<T, F>(&self, work: F) -> Result<Committed<T>, StockError>
    where
        F: FnOnce(&mut Transaction<S>) -> Result<T, StockError>,
    {
        let mut tx = self.begin();
        match work(&mut tx) {
            Ok(value) => {
                let records = tx.commit()?;
                Ok(Committed { value, records })
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    /// Run `work` according to `propagation`, relative to `outer`.
    pub fn execute_with<T, F>(
        &self,
        outer: Option<&mut Transaction<S>>,
        propagation: Propagation,
        work: F,
    ) -> Result<Committed<T>, StockError>
    where
        F: FnOnce(&mut Transaction<S>) -> Result<T, StockError>,
    {
        match (propagation, outer) {
            (Propagation::Required, Some(tx)) => {
                tracing::trace!(tx = tx.id(), "joining caller transaction");
                let value = work(tx)?;
                Ok(Committed {
                    value,
                    records: Vec::new(),
                })
            }
            _ => self.execute(work),
        }
    }
}
