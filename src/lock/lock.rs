use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::LockError;

/// Trait for a single exclusive lock instance.
///
/// In-memory locks use `Mutex` + `Condvar`; a database-backed store would map
/// these onto `SELECT ... FOR UPDATE` or advisory lock calls.
pub trait Lock: Send + Sync {
    /// Try to acquire the lock without blocking.
    /// Returns `Ok(true)` if acquired, `Ok(false)` if already held.
    fn try_lock(&self) -> Result<bool, LockError>;

    /// Acquire the lock, blocking for at most `timeout`.
    /// Returns `Ok(false)` if the wait elapsed without acquiring.
    fn try_lock_for(&self, timeout: Duration) -> Result<bool, LockError>;

    /// Release the lock. Releasing an unheld lock is a no-op.
    fn unlock(&self) -> Result<(), LockError>;
}

/// Holds a [`Lock`] until dropped.
pub struct LockGuard<L: Lock> {
    lock: Arc<L>,
    key: String,
}

impl<L: Lock> LockGuard<L> {
    /// Acquire `lock` within `timeout`. `Ok(None)` means the wait elapsed.
    pub fn acquire(
        lock: Arc<L>,
        key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Option<Self>, LockError> {
        let key = key.into();
        if !lock.try_lock_for(timeout)? {
            return Ok(None);
        }
        tracing::trace!(key = %key, "lock acquired");
        Ok(Some(LockGuard { lock, key }))
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<L: Lock> fmt::Debug for LockGuard<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").field("key", &self.key).finish()
    }
}

impl<L: Lock> Drop for LockGuard<L> {
    fn drop(&mut self) {
        match self.lock.unlock() {
            Ok(()) => tracing::trace!(key = %self.key, "lock released"),
            Err(e) => tracing::error!(key = %self.key, error = %e, "failed to release lock"),
        }
    }
}
