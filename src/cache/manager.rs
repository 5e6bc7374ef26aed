// Query cache - memoizes query results per (operation, arguments)
// Author: kelexine (https://github.com/kelexine)

use super::key::CacheKey;
use super::models::{CacheConfig, CacheStats, CachedValue};
use super::store::{MemoryStore, TimestampedStore};
use crate::metrics;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::debug;

/// In-memory query cache with a background expiry sweep.
///
/// Entries are overwritten on every write (last write wins) and removed by
/// the periodic sweep once their age reaches the TTL. Between the TTL and
/// the next sweep tick a stale entry is still served.
///
/// The cache is owned by whoever builds it: nothing runs until
/// [`QueryCache::start`] is called, and [`QueryCache::stop`] ends the sweep.
/// Clones share the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

struct Inner {
    config: CacheConfig,
    store: Mutex<TimestampedStore<MemoryStore>>,
    stats: Mutex<CacheStats>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl QueryCache {
    /// Create a new, idle cache
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                store: Mutex::new(TimestampedStore::new(MemoryStore::new())),
                stats: Mutex::new(CacheStats::default()),
                sweeper: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn read(&self, key: &CacheKey) -> Option<CachedValue> {
        self.read_at(key, Instant::now())
    }

    /// Looks up `key` as of `now`. Never blocks on the network.
    pub fn read_at(&self, key: &CacheKey, now: Instant) -> Option<CachedValue> {
        let cached = self.inner.store.lock().read(key, now);

        let mut stats = self.inner.stats.lock();
        match &cached {
            Some(value) => {
                debug!("Cache hit: {} (age {:?})", key, value.age);
                stats.hits += 1;
                metrics::record_cache_operation("hit");
            }
            None => {
                debug!("Cache miss: {}", key);
                stats.misses += 1;
                metrics::record_cache_operation("miss");
            }
        }
        cached
    }

    pub fn write(&self, key: CacheKey, payload: Value) {
        self.write_at(key, payload, Instant::now())
    }

    /// Replaces the entry for `key` and resets its timestamp to `now`.
    pub fn write_at(&self, key: CacheKey, payload: Value, now: Instant) {
        debug!("Cache write: {}", key);
        let entries = {
            let mut store = self.inner.store.lock();
            store.write(key, payload, now);
            store.len()
        };
        self.inner.stats.lock().writes += 1;
        metrics::record_cache_operation("write");
        metrics::update_cache_entries(entries);
    }

    /// Deletes every entry whose age at `now` is at least the TTL.
    pub fn sweep(&self, now: Instant) -> usize {
        self.inner.sweep(now)
    }

    /// Spawns the periodic sweep on the current Tokio runtime. Calling it
    /// while the sweep is already running does nothing.
    pub fn start(&self) {
        let mut sweeper = self.inner.sweeper.lock();
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let period = self.inner.config.sweep_interval;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        debug!("Starting cache sweep every {:?}", period);
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.sweep(Instant::now());
            }
        }));
    }

    /// Stops the periodic sweep. Entries are kept.
    pub fn stop(&self) {
        if let Some(handle) = self.inner.sweeper.lock().take() {
            handle.abort();
            debug!("Cache sweep stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.lock().is_empty()
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.inner.store.lock().clear();
        metrics::update_cache_entries(0);
        debug!("Cache cleared");
    }
}

impl Inner {
    fn sweep(&self, now: Instant) -> usize {
        let (removed, remaining) = {
            let mut store = self.store.lock();
            let removed = store.sweep(now, self.config.ttl);
            (removed, store.len())
        };

        if removed > 0 {
            debug!("Cache sweep evicted {} entries", removed);
            self.stats.lock().evictions += removed as u64;
            for _ in 0..removed {
                metrics::record_cache_operation("eviction");
            }
            metrics::update_cache_entries(remaining);
        }
        removed
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}
