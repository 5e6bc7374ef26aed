//! Cache configuration and statistics models.

// Author: kelexine (https://github.com/kelexine)

use crate::config::ClientConfig;
use serde_json::Value;
use std::time::Duration;

/// Configuration for the query cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Age at which an entry becomes eligible for the sweep.
    pub ttl: Duration,
    /// Period of the background sweep.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    /// Provides default values for cache configuration.
    ///
    /// - `ttl`: 60 seconds
    /// - `sweep_interval`: 5 seconds
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(5),
        }
    }
}

impl From<&ClientConfig> for CacheConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            ttl: config.cache_ttl(),
            sweep_interval: config.sweep_interval(),
        }
    }
}

/// Statistics for cache operations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of reads answered from the cache.
    pub hits: u64,
    /// Number of reads that found nothing.
    pub misses: u64,
    /// Number of entries written or overwritten.
    pub writes: u64,
    /// Number of entries removed by the sweep.
    pub evictions: u64,
}

/// A payload read back from the cache together with its age.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub payload: Value,
    pub age: Duration,
}
