use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::LockError;

/// Identifies the session (connection, in database terms) that owns named locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

struct Holder {
    session: SessionId,
    depth: u32,
}

/// Advisory locks keyed by arbitrary strings, independent of any row.
///
/// Mirrors `GET_LOCK` / `RELEASE_LOCK` semantics:
/// - a lock is owned by one session at a time
/// - the owning session may acquire it again (each acquire needs a release)
/// - releasing a lock the session does not hold is a no-op
pub struct InMemoryNamedLocks {
    held: Mutex<HashMap<String, Holder>>,
    wake: Condvar,
    next_session: AtomicU64,
}

impl InMemoryNamedLocks {
    pub fn new() -> Self {
        InMemoryNamedLocks {
            held: Mutex::new(HashMap::new()),
            wake: Condvar::new(),
            next_session: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh session id.
    pub fn open_session(&self) -> SessionId {
        SessionId(self.next_session.fetch_add(1, Ordering::Relaxed))
    }

    /// Acquire `key` for `session`, waiting at most `timeout`.
    ///
    /// Returns `Ok(false)` if another session still holds the lock when the
    /// wait elapses.
    pub fn acquire(
        &self,
        session: SessionId,
        key: &str,
        timeout: Duration,
    ) -> Result<bool, LockError> {
        let deadline = Instant::now() + timeout;
        let mut held = self
            .held
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))?;

        loop {
            match held.get_mut(key) {
                None => {
                    held.insert(key.to_string(), Holder { session, depth: 1 });
                    return Ok(true);
                }
                Some(holder) if holder.session == session => {
                    holder.depth += 1;
                    return Ok(true);
                }
                Some(_) => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            let (guard, _) = self
                .wake
                .wait_timeout(held, deadline - now)
                .map_err(|e| LockError::Poisoned(e.to_string()))?;
            held = guard;
        }
    }

    /// Release one hold of `key` by `session`.
    ///
    /// Returns `Ok(true)` if a hold was released, `Ok(false)` if the session
    /// did not hold the lock (never acquired, already released, or owned by
    /// another session).
    pub fn release(&self, session: SessionId, key: &str) -> Result<bool, LockError> {
        let mut held = self
            .held
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))?;

        let Some(holder) = held.get_mut(key) else {
            return Ok(false);
        };
        if holder.session != session {
            return Ok(false);
        }

        holder.depth -= 1;
        if holder.depth == 0 {
            held.remove(key);
            // Waiters on every key share the condvar.
            self.wake.notify_all();
        }
        Ok(true)
    }

    /// The session currently holding `key`, if any.
    pub fn holder(&self, key: &str) -> Result<Option<SessionId>, LockError> {
        let held = self
            .held
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))?;
        Ok(held.get(key).map(|h| h.session))
    }
}

impl Default for InMemoryNamedLocks {
    fn default() -> Self {
        Self::new()
    }
}
