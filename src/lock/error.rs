use thiserror::Error;

/// Error type for lock operations.
///
/// Timeouts are not errors at this level: bounded acquisitions report
/// `Ok(false)` and callers decide how to surface them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The underlying lock primitive was poisoned (a thread panicked while holding it).
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}
