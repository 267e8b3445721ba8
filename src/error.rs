use std::time::Duration;

use thiserror::Error;

use crate::lock::LockError;
use crate::stock::StockId;

/// Error type shared by the store, the transaction manager and every
/// strategy executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// No record exists for the id.
    #[error("stock {id} not found")]
    NotFound { id: StockId },

    /// Seeding an id that already has a record.
    #[error("stock {id} already exists")]
    AlreadyExists { id: StockId },

    /// Decrements must be strictly positive.
    #[error("invalid decrement of {requested} for stock {id}: must be greater than zero")]
    InvalidQuantity { id: StockId, requested: u64 },

    /// The decrement would drive the quantity negative. Never retried.
    #[error("insufficient stock for {id}: requested {requested}, available {available}")]
    InsufficientStock {
        id: StockId,
        requested: u64,
        available: u64,
    },

    /// A bounded lock wait elapsed.
    #[error("timed out after {waited:?} waiting for lock {key}")]
    LockTimeout { key: String, waited: Duration },

    /// The stored version moved since the record was read.
    #[error("version conflict on stock {id} (expected version {expected}, actual {actual})")]
    VersionConflict {
        id: StockId,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Lock(#[from] LockError),

    /// Row encoding/decoding failure inside a store.
    #[error("row codec error: {0}")]
    Codec(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StockError {
    /// Only optimistic version conflicts may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StockError::VersionConflict { .. })
    }
}
