use super::{DecreaseStock, Decrement, Strategy};
use crate::config::StockConfig;
use crate::error::StockError;
use crate::stock::StockId;
use crate::store::StockStore;
use crate::transaction::TransactionManager;

/// Read, decrement and write in a plain transaction with no concurrency guard.
///
/// Concurrent callers read the same quantity and overwrite each other's
/// writes (lost updates). It exists as the baseline that shows the race.
pub struct UnsynchronizedExecutor<S> {
    transactions: TransactionManager<S>,
}

impl<S: StockStore + Clone> UnsynchronizedExecutor<S> {
    pub fn new(store: S, config: &StockConfig) -> Self {
        UnsynchronizedExecutor {
            transactions: TransactionManager::new(store, config),
        }
    }
}

impl<S: StockStore + Clone> DecreaseStock for UnsynchronizedExecutor<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Unsynchronized
    }

    fn decrease(&self, id: StockId, delta: u64) -> Result<Decrement, StockError> {
        let committed = self.transactions.execute(|tx| {
            let mut record = tx.read(id)?;
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
