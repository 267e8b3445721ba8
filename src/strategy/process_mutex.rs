use std::sync::Mutex;

use super::{DecreaseStock, Decrement, Strategy};
use crate::config::StockConfig;
use crate::error::StockError;
use crate::lock::LockError;
use crate::stock::StockId;
use crate::store::StockStore;
use crate::transaction::TransactionManager;

/// When the guarded write reaches the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitMode {
    /// Read, decrement and write complete inside the critical section.
    #[default]
    Immediate,
    /// The critical section only buffers the write in a transaction, which
    /// commits after the mutex is released. Another thread can read the
    /// pre-commit quantity in between, so updates are lost under contention.
    Deferred,
}

/// Serializes decrements through one in-process mutex.
///
/// Only correct for callers that share this executor: a second executor,
/// or a second process, has its own mutex.
pub struct ProcessMutexExecutor<S> {
    store: S,
    transactions: TransactionManager<S>,
    guard: Mutex<()>,
    mode: CommitMode,
}

impl<S: StockStore + Clone> ProcessMutexExecutor<S> {
    pub fn new(store: S, config: &StockConfig) -> Self {
        ProcessMutexExecutor {
            transactions: TransactionManager::new(store.clone(), config),
            store,
            guard: Mutex::new(()),
            mode: CommitMode::Immediate,
        }
    }

    pub fn with_commit_mode(mut self, mode: CommitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.mode
    }

    fn decrease_immediate(&self, id: StockId, delta: u64) -> Result<Decrement, StockError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))?;

        let mut record = self.store.read_plain(id)?;
        record.decrease(delta)?;
        let written = self.store.write(&record)?;

        Ok(Decrement {
            id,
            delta,
            remaining: written.quantity(),
            read_version: None,
            version: written.version(),
            attempts: 1,
        })
    }

    fn decrease_deferred(&self, id: StockId, delta: u64) -> Result<Decrement, StockError> {
        let mut tx = self.transactions.begin();
        let remaining = {
            let _guard = self
                .guard
                .lock()
                .map_err(|e| LockError::Poisoned(e.to_string()))?;
            let mut record = tx.read(id)?;
            record.decrease(delta)?;
            let remaining = record.quantity();
            tx.write(record);
            remaining
        };
        let written = tx.commit()?;

        Ok(Decrement {
            id,
            delta,
            remaining,
            read_version: None,
            version: written.first().and_then(|r| r.version()),
            attempts: 1,
        })
    }
}

impl<S: StockStore + Clone> DecreaseStock for ProcessMutexExecutor<S> {
    fn strategy(&self) -> Strategy {
        Strategy::ProcessMutex
    }

    fn decrease(&self, id: StockId, delta: u64) -> Result<Decrement, StockError> {
        match self.mode {
            CommitMode::Immediate => self.decrease_immediate(id, delta),
            CommitMode::Deferred => self.decrease_deferred(id, delta),
        }
    }
}
