use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Cores kept free for the runtime and the node when concurrency is `auto`.
const RESERVED_CORES: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub rpc_url: String,
    pub batch_size: u64,
    pub concurrency: Concurrency,
    pub retries: i64,
    pub txs_per_page: u32,
    pub progress_queue_capacity: usize,
    pub request_timeout_secs: u64,
}

/// Number of chunk workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Concurrency {
    Auto,
    Value(usize),
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8081".to_string(),
            batch_size: 250,
            concurrency: Concurrency::Auto,
            retries: 100,
            txs_per_page: 1000,
            progress_queue_capacity: 8192,
            request_timeout_secs: 30,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(Error::Config("rpc_url must not be empty".to_string()));
        }
        if self.batch_size < 1 {
            return Err(Error::Config("batch_size must be >= 1".to_string()));
        }
        if let Concurrency::Value(0) = self.concurrency {
            return Err(Error::Config("concurrency must be >= 1".to_string()));
        }
        if self.retries < 0 {
            return Err(Error::Config("retries must be >= 0".to_string()));
        }
        if self.txs_per_page < 1 {
            return Err(Error::Config("txs_per_page must be >= 1".to_string()));
        }
        if self.progress_queue_capacity < 1 {
            return Err(Error::Config(
                "progress_queue_capacity must be >= 1".to_string(),
            ));
        }
        if self.request_timeout_secs < 1 {
            return Err(Error::Config(
                "request_timeout_secs must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Concurrency {
    /// Worker count; `Auto` leaves a few cores free and never goes below one.
    pub fn resolve(self) -> usize {
        match self {
            Self::Value(n) => n.max(1),
            Self::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .saturating_sub(RESERVED_CORES)
                .max(1),
        }
    }
}

impl Serialize for Concurrency {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::Value(v) => serializer.serialize_u64(*v as u64),
        }
    }
}

impl<'de> Deserialize<'de> for Concurrency {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ConcurrencyVisitor;
        impl<'de> Visitor<'de> for ConcurrencyVisitor {
            type Value = Concurrency;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "\"auto\" or positive integer")
            }
            fn visit_str<E>(self, v: &str) -> core::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                if v == "auto" {
                    Ok(Concurrency::Auto)
                } else {
                    Err(E::custom("concurrency string form must be \"auto\""))
                }
            }
            fn visit_u64<E>(self, v: u64) -> core::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                usize::try_from(v)
                    .map(Concurrency::Value)
                    .map_err(|_| E::custom("concurrency exceeds usize"))
            }
            fn visit_i64<E>(self, v: i64) -> core::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                usize::try_from(v)
                    .map(Concurrency::Value)
                    .map_err(|_| E::custom("concurrency must be non-negative"))
            }
        }
        deserializer.deserialize_any(ConcurrencyVisitor)
    }
}
