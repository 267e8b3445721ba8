use serde::{Deserialize, Serialize};

use super::StockId;
use crate::error::StockError;

/// A transient copy of a stock row.
///
/// `version` is only present on copies obtained through a versioned read;
/// writing such a copy back is conditional on the stored version still
/// matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    id: StockId,
    quantity: u64,
    version: Option<u64>,
}

impl StockRecord {
    /// A fresh, unversioned record, as used for seeding.
    pub fn new(id: impl Into<StockId>, quantity: u64) -> Self {
        StockRecord {
            id: id.into(),
            quantity,
            version: None,
        }
    }

    pub fn id(&self) -> StockId {
        self.id
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub(crate) fn with_version(mut self, version: Option<u64>) -> Self {
        self.version = version;
        self
    }

    /// Take `delta` units out of stock.
    ///
    /// Pure: no I/O and no locking. Safety under contention comes entirely
    /// from how callers sequence the surrounding read and write. On error the
    /// record is left untouched.
    pub fn decrease(&mut self, delta: u64) -> Result<(), StockError> {
        if delta == 0 {
            return Err(StockError::InvalidQuantity {
                id: self.id,
                requested: delta,
            });
        }
        if self.quantity < delta {
            return Err(StockError::InsufficientStock {
                id: self.id,
                requested: delta,
                available: self.quantity,
            });
        }
        self.quantity -= delta;
        Ok(())
    }
}
