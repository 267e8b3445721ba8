//! Transaction boundaries.
//!
//! A [`Transaction`] buffers writes and holds row locks; both are settled when
//! it commits or rolls back. [`TransactionManager`] opens transactions and
//! decides, per [`Propagation`], whether work joins a caller's transaction or
//! runs in a new, independent one.

mod manager;
mod unit_of_work;

pub use manager::{Committed, Propagation, TransactionManager};
pub use unit_of_work::Transaction;
