use std::thread;
use std::time::Duration;

use super::{DecreaseStock, Decrement, Strategy};
use crate::config::StockConfig;
use crate::error::StockError;
use crate::stock::StockId;
use crate::store::StockStore;
use crate::transaction::TransactionManager;

/// Reads without locking and writes conditionally on the read version.
///
/// A version conflict can only be seen once the transaction tries to commit,
/// so each attempt is a whole transaction and the retry loop sits outside
/// it. Conflicts are retried after a fixed backoff with no attempt limit;
/// callers that need a deadline must impose one themselves. Every other
/// error, `InsufficientStock` included, ends the loop.
pub struct OptimisticLockExecutor<S> {
    transactions: TransactionManager<S>,
    backoff: Duration,
}

impl<S: StockStore + Clone> OptimisticLockExecutor<S> {
    pub fn new(store: S, config: &StockConfig) -> Self {
        OptimisticLockExecutor {
            transactions: TransactionManager::new(store, config),
            backoff: config.optimistic_backoff,
        }
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// One read-decrement-commit attempt.
    fn attempt(&self, id: StockId, delta: u64, attempts: u32) -> Result<Decrement, StockError> {
        let committed = self.transactions.execute(|tx| {
            let mut record = tx.read_versioned(id)?;
            let read_version = record.version();
            record.decrease(delta)?;
            let remaining = record.quantity();
            tx.write(record);
            Ok((remaining, read_version))
        })?;

        let (remaining, read_version) = committed.value;
        Ok(Decrement {
            id,
            delta,
            remaining,
            read_version,
            version: committed.version_of(id),
            attempts,
        })
    }
}

impl<S: StockStore + Clone> DecreaseStock for OptimisticLockExecutor<S> {
    fn strategy(&self) -> Strategy {
        Strategy::OptimisticLock
    }

    fn decrease(&self, id: StockId, delta: u64) -> Result<Decrement, StockError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.attempt(id, delta, attempts) {
                Ok(decrement) => {
                    tracing::debug!(
                        stock_id = %id,
                        delta,
                        remaining = decrement.remaining,
                        attempts,
                        "decreased"
                    );
                    return Ok(decrement);
                }
                Err(e) if e.is_retryable() => {
                    tracing::debug!(
                        stock_id = %id,
                        attempt = attempts,
                        error = %e,
                        "conflict, retrying"
                    );
                    thread::sleep(self.backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
