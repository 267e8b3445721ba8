//! Tunables shared by the store, the transaction manager and the executors.
//!
//! Durations are (de)serialized as integer milliseconds:
//!
//! ```ignore
//! let config = StockConfig::from_json(r#"{ "optimistic_backoff": 5, "store_latency": 1 }"#)?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StockError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StockConfig {
    /// Bound on waiting for a row lock in `read_for_update`.
    #[serde(with = "millis")]
    pub row_lock_timeout: Duration,

    /// Bound on waiting for a named lock.
    #[serde(with = "millis")]
    pub named_lock_timeout: Duration,

    /// Pause between optimistic attempts after a version conflict.
    #[serde(with = "millis")]
    pub optimistic_backoff: Duration,

    /// Prepended to the stock id to form the named-lock key.
    pub named_lock_prefix: String,

    /// Simulated round trip added to every store read and write.
    #[serde(with = "millis")]
    pub store_latency: Duration,
}

impl Default for StockConfig {
    fn default() -> Self {
        StockConfig {
            row_lock_timeout: Duration::from_secs(3),
            named_lock_timeout: Duration::from_secs(3),
            optimistic_backoff: Duration::from_millis(100),
            named_lock_prefix: "stock:".to_string(),
            store_latency: Duration::ZERO,
        }
    }
}

impl StockConfig {
    pub fn from_json(json: &str) -> Result<Self, StockError> {
        serde_json::from_str(json).map_err(|e| StockError::Config(e.to_string()))
    }

    pub fn with_row_lock_timeout(mut self, timeout: Duration) -> Self {
        self.row_lock_timeout = timeout;
        self
    }

    pub fn with_named_lock_timeout(mut self, timeout: Duration) -> Self {
        self.named_lock_timeout = timeout;
        self
    }

    pub fn with_optimistic_backoff(mut self, backoff: Duration) -> Self {
        self.optimistic_backoff = backoff;
        self
    }

    pub fn with_named_lock_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.named_lock_prefix = prefix.into();
        self
    }

    pub fn with_store_latency(mut self, latency: Duration) -> Self {
        self.store_latency = latency;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).map_err(serde::ser::Error::custom)?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
