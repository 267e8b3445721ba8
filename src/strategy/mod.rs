//! Strategy executors - five ways to run "decrease quantity by N" under
//! contention.
//!
//! | Strategy | Guard | Surfaces | Retries |
//! |---|---|---|---|
//! | [`UnsynchronizedExecutor`] | none | nothing; loses updates | no |
//! | [`ProcessMutexExecutor`] | in-process mutex | nothing; single process only | no |
//! | [`PessimisticLockExecutor`] | row lock for the whole transaction | `LockTimeout`, `InsufficientStock` | no |
//! | [`OptimisticLockExecutor`] | version check at commit | `InsufficientStock` | on conflict, fixed backoff |
//! | [`NamedLockExecutor`] | named lock around a new transaction | `LockTimeout`, `InsufficientStock` | no |
//!
//! ## Example
//!
//! ```ignore
//! use stock_guard::{InMemoryStockStore, StockConfig, StockRecord, StockStore, Strategy};
//!
//! let store = InMemoryStockStore::new();
//! store.insert(&StockRecord::new(1, 100))?;
//!
//! let executor = Strategy::PessimisticLock.executor(store.clone(), &StockConfig::default());
//! let decrement = executor.decrease(1.into(), 3)?;
//! assert_eq!(decrement.remaining, 97);
//! ```

mod named_lock;
mod optimistic;
mod pessimistic;
mod process_mutex;
mod unsynchronized;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::StockConfig;
use crate::error::StockError;
use crate::stock::StockId;
use crate::store::StockStore;

pub use named_lock::NamedLockExecutor;
pub use optimistic::OptimisticLockExecutor;
pub use pessimistic::PessimisticLockExecutor;
pub use process_mutex::{CommitMode, ProcessMutexExecutor};
pub use unsynchronized::UnsynchronizedExecutor;

/// Outcome of a successful decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrement {
    pub id: StockId,
    pub delta: u64,
    /// Quantity left after this decrement, as seen by the caller.
    pub remaining: u64,
    /// Version the record was read at (optimistic reads only).
    pub read_version: Option<u64>,
    /// Version the write was committed at, when this call committed it.
    pub version: Option<u64>,
    /// Attempts taken, including the successful one.
    pub attempts: u32,
}

/// The single public entry point of every strategy.
pub trait DecreaseStock: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Take `delta` units out of stock `id`.
    fn decrease(&self, id: StockId, delta: u64) -> Result<Decrement, StockError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Unsynchronized,
    ProcessMutex,
    PessimisticLock,
    OptimisticLock,
    NamedLock,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Unsynchronized,
        Strategy::ProcessMutex,
        Strategy::PessimisticLock,
        Strategy::OptimisticLock,
        Strategy::NamedLock,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Unsynchronized => "unsynchronized",
            Strategy::ProcessMutex => "process_mutex",
            Strategy::PessimisticLock => "pessimistic_lock",
            Strategy::OptimisticLock => "optimistic_lock",
            Strategy::NamedLock => "named_lock",
        }
    }

    /// Whether concurrent decrements through the executor built by
    /// [`Strategy::executor`] keep exact accounting within one process.
    ///
    /// For `ProcessMutex` this holds for [`CommitMode::Immediate`] only; an
    /// executor switched to [`CommitMode::Deferred`] loses updates.
    pub fn is_safe(self) -> bool {
        !matches!(self, Strategy::Unsynchronized)
    }

    /// Build the executor for this strategy over `store`.
    ///
    /// `ProcessMutex` is built with [`CommitMode::Immediate`].
    pub fn executor<S>(self, store: S, config: &StockConfig) -> Box<dyn DecreaseStock>
    where
        S: StockStore + Clone + 'static,
    {
        match self {
            Strategy::Unsynchronized => Box::new(UnsynchronizedExecutor::new(store, config)),
            Strategy::ProcessMutex => Box::new(ProcessMutexExecutor::new(store, config)),
            Strategy::PessimisticLock => Box::new(PessimisticLockExecutor::new(store, config)),
            Strategy::OptimisticLock => Box::new(OptimisticLockExecutor::new(store, config)),
            Strategy::NamedLock => Box::new(NamedLockExecutor::new(store, config)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
