use std::sync::Arc;

use super::{Lock, LockError};

/// Factory trait for obtaining per-key locks.
///
/// Stores use a `LockManager` to hand out one row lock per stock id, keyed
/// as `row:<id>`. Anything holding the returned `Arc` must see the same lock
/// as every later caller for that key, so implementations never swap a key's
/// lock out while it may be held.
pub trait LockManager: Send + Sync {
    /// The concrete lock type returned by this manager.
    type Lock: Lock;

    /// Get (or create) the lock for the given key.
    ///
    /// Repeated calls with the same `key` must return the same logical lock.
    fn get_lock(&self, key: &str) -> Result<Arc<Self::Lock>, LockError>;
}
