use std::time::Duration;

use super::{DecreaseStock, Decrement, Strategy};
use crate::config::StockConfig;
use crate::error::StockError;
use crate::lock::SessionId;
use crate::stock::StockId;
use crate::store::StockStore;
use crate::transaction::{Propagation, Transaction, TransactionManager};

/// Guards each decrement with a named lock keyed by the stock id.
///
/// The lock is taken before any unit of work opens, and the decrement runs
/// in a new transaction that commits before the lock is released. Were the
/// decrement to join the caller's transaction instead, the lock would be
/// released before that transaction commits and the next holder could read
/// the pre-commit quantity.
pub struct NamedLockExecutor<S> {
    store: S,
    transactions: TransactionManager<S>,
    timeout: Duration,
    prefix: String,
}

/// Releases the named lock when dropped, whether or not it was acquired.
struct NamedLockHold<'a, S: StockStore> {
    store: &'a S,
    session: SessionId,
    key: &'a str,
}

impl<S: StockStore> Drop for NamedLockHold<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.store.release_named_lock(self.session, self.key) {
            tracing::error!(
                key = self.key,
                session = %self.session,
                error = %e,
                "failed to release named lock"
            );
        }
    }
}

impl<S: StockStore + Clone> NamedLockExecutor<S> {
    pub fn new(store: S, config: &StockConfig) -> Self {
        NamedLockExecutor {
            transactions: TransactionManager::new(store.clone(), config),
            store,
            timeout: config.named_lock_timeout,
            prefix: config.named_lock_prefix.clone(),
        }
    }

    /// The named-lock key guarding `id`.
    pub fn lock_key(&self, id: StockId) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Decrease while the caller holds `outer`.
    ///
    /// The named lock is taken on `outer`'s session (so it is reentrant for
    /// that caller), but the decrement still commits in its own transaction
    /// before the lock is released; `outer` neither sees nor settles it.
    pub fn decrease_in(
        &self,
        outer: Option<&mut Transaction<S>>,
        id: StockId,
        delta: u64,
    ) -> Result<Decrement, StockError> {
        let key = self.lock_key(id);
        let session = match outer.as_ref() {
            Some(tx) => tx.session(),
            None => self.store.open_session(),
        };

        let _hold = NamedLockHold {
            store: &self.store,
            session,
            key: &key,
        };
        if !self.store.acquire_named_lock(session, &key, self.timeout)? {
            return Err(StockError::LockTimeout {
                key: key.clone(),
                waited: self.timeout,
            });
        }

        let committed = self
            .transactions
            .execute_with(outer, Propagation::RequiresNew, |tx| {
                let mut record = tx.read(id)?;
                record.decrease(delta)?;
                let remaining = record.quantity();
                tx.write(record);
                Ok(remaining)
            })?;

        tracing::debug!(stock_id = %id, key = %key, remaining = committed.value, "decreased");
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

impl<S: StockStore + Clone> DecreaseStock for NamedLockExecutor<S> {
    fn strategy(&self) -> Strategy {
        Strategy::NamedLock
    }

    fn decrease(&self, id: StockId, delta: u64) -> Result<Decrement, StockError> {
        self.decrease_in(None, id, delta)
    }
}
