//! Five ways to decrease a stock quantity under concurrent callers, over a
//! versioned in-memory store with row locks, named locks and transactions.

mod config;
mod error;
pub mod lock;
mod stock;
pub mod store;
pub mod strategy;
pub mod transaction;

pub use config::StockConfig;
pub use error::StockError;
pub use lock::{LockError, SessionId};
pub use stock::{StockId, StockRecord};
pub use store::{InMemoryStockStore, StockStore};
pub use strategy::{
    CommitMode, DecreaseStock, Decrement, NamedLockExecutor, OptimisticLockExecutor,
    PessimisticLockExecutor, ProcessMutexExecutor, Strategy, UnsynchronizedExecutor,
};
pub use transaction::{Committed, Propagation, Transaction, TransactionManager};
