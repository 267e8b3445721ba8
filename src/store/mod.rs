//! Stores - the persistence collaborator behind every strategy.
//!
//! A store owns the durable copy of each stock row and offers plain,
//! versioned and lock-for-update reads, conditional writes, and named
//! (advisory) locks.
//!
//! ## Example
//!
//! ```ignore
//! use stock_guard::{InMemoryStockStore, StockRecord, StockStore};
//!
//! let store = InMemoryStockStore::new();
//! store.insert(&StockRecord::new(1, 100))?;
//!
//! let mut record = store.read_versioned(1.into())?;
//! record.decrease(1)?;
//! store.write(&record)?; // fails with VersionConflict if someone wrote first
//! ```

mod in_memory;
mod store;

pub use in_memory::InMemoryStockStore;
pub use store::StockStore;
