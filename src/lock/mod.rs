//! Lock primitives used by the stores and strategy executors.
//!
//! - [`Lock`] / [`LockManager`]: exclusive per-key locks with bounded waits,
//!   used for row-level locking.
//! - [`LockGuard`]: RAII hold on a [`Lock`], released on drop.
//! - [`InMemoryNamedLocks`]: advisory locks keyed by arbitrary strings,
//!   owned by a [`SessionId`] and reentrant within that session.

mod error;
mod in_memory;
mod lock;
mod lock_manager;
mod named;

pub use error::LockError;
pub use in_memory::{InMemoryLock, InMemoryLockManager};
pub use lock::{Lock, LockGuard};
pub use lock_manager::LockManager;
pub use named::{InMemoryNamedLocks, SessionId};
