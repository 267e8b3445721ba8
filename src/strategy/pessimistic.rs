use super::{DecreaseStock, Decrement, Strategy};
use crate::config::StockConfig;
use crate::error::StockError;
use crate::stock::StockId;
use crate::store::StockStore;
use crate::transaction::{Propagation, Transaction, TransactionManager};

/// Locks the row at read time and keeps it locked until the transaction
/// ends. Contending callers block (up to the row lock timeout) and never
/// retry.
pub struct PessimisticLockExecutor<S> {
    transactions: TransactionManager<S>,
}

impl<S: StockStore + Clone> PessimisticLockExecutor<S> {
    pub fn new(store: S, config: &StockConfig) -> Self {
        PessimisticLockExecutor {
            transactions: TransactionManager::new(store, config),
        }
    }

    /// Decrease inside `outer` when given. The row lock then lasts until
    /// `outer` ends, and the write lands when `outer` commits.
    pub fn decrease_in(
        &self,
        outer: Option<&mut Transaction<S>>,
        id: StockId,
        delta: u64,
    ) -> Result<Decrement, StockError> {
        let committed = self
            .transactions
            .execute_with(outer, Propagation::Required, |tx| {
                let mut record = tx.read_for_update(id)?;
                record.decrease(delta)?;
                let remaining = record.quantity();
                tx.write(record);
                Ok(remaining)
            })?;

        Ok(Decrement {
            id,
            delta,
            remaining: committed.value,
            read_version: None,
            version: committed.version_of(id),
            attempts: 1,
        })
    }
}

impl<S: StockStore + Clone> DecreaseStock for PessimisticLockExecutor<S> {
    fn strategy(&self) -> Strategy {
        Strategy::PessimisticLock
    }

    fn decrease(&self, id: StockId, delta: u64) -> Result<Decrement, StockError> {
        self.decrease_in(None, id, delta)
    }
}
