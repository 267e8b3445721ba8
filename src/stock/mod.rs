//! The stock record and its decrement operation.

mod record;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use record::StockRecord;

/// Stable identifier of a stock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockId(u64);

impl StockId {
    pub const fn new(id: u64) -> Self {
        StockId(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for StockId {
    fn from(id: u64) -> Self {
        StockId(id)
    }
}

impl fmt::Display for StockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
