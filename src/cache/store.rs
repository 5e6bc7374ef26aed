//! Storage layers behind the query cache.
//!
//! [`MemoryStore`] only maps keys to payloads. [`TimestampedStore`] wraps any
//! [`CacheStore`] and records when each key was last written, which is all
//! the sweep needs to decide what has expired.

// Author: kelexine (https://github.com/kelexine)

use super::key::CacheKey;
use super::models::CachedValue;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Key/value storage for query payloads.
pub trait CacheStore: Send {
    fn get(&self, key: &CacheKey) -> Option<Value>;

    /// Replaces any existing payload for `key`.
    fn put(&mut self, key: CacheKey, value: Value);

    fn remove(&mut self, key: &CacheKey) -> bool;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Plain in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<CacheKey, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: CacheKey, value: Value) {
        self.entries.insert(key, value);
    }

    fn remove(&mut self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Decorator that tracks the last write time of every key.
#[derive(Debug, Default)]
pub struct TimestampedStore<S> {
    inner: S,
    written_at: HashMap<CacheKey, Instant>,
}

impl<S: CacheStore> TimestampedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            written_at: HashMap::new(),
        }
    }

    /// Overwrites the payload for `key` and resets its timestamp to `now`.
    /// Other keys and their timestamps are untouched.
    pub fn write(&mut self, key: CacheKey, payload: Value, now: Instant) {
        self.written_at.insert(key.clone(), now);
        self.inner.put(key, payload);
    }

    pub fn read(&self, key: &CacheKey, now: Instant) -> Option<CachedValue> {
        let payload = self.inner.get(key)?;
        let age = self
            .written_at
            .get(key)
            .map(|written| now.saturating_duration_since(*written))
            .unwrap_or_default();
        Some(CachedValue { payload, age })
    }

    /// Removes every entry whose age is at least `ttl`. Returns the number
    /// of entries removed.
    pub fn sweep(&mut self, now: Instant, ttl: Duration) -> usize {
        let expired: Vec<CacheKey> = self
            .written_at
            .iter()
            .filter(|(_, written)| now.saturating_duration_since(**written) >= ttl)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.written_at.remove(key);
            self.inner.remove(key);
        }
        expired.len()
    }

    pub fn clear(&mut self) {
        self.written_at.clear();
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(search: &str) -> CacheKey {
        CacheKey::from_value("movies", &json!({ "where": { "search": search } }))
    }

    #[test]
    fn test_overwrite_replaces_payload_without_merge() {
        let mut store = TimestampedStore::new(MemoryStore::new());
        let t0 = Instant::now();

        store.write(key("a"), json!({ "title": "first", "extra": true }), t0);
        store.write(key("a"), json!({ "title": "second" }), t0);

        let cached = store.read(&key("a"), t0).unwrap();
        assert_eq!(cached.payload, json!({ "title": "second" }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_write_does_not_touch_other_timestamps() {
        let mut store = TimestampedStore::new(MemoryStore::new());
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(30);

        store.write(key("a"), json!(1), t0);
        store.write(key("b"), json!(2), t1);

        assert_eq!(store.read(&key("a"), t1).unwrap().age, Duration::from_secs(30));
        assert_eq!(store.read(&key("b"), t1).unwrap().age, Duration::ZERO);
        assert!(store.read(&key("c"), t1).is_none());
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let mut store = TimestampedStore::new(MemoryStore::new());
        let ttl = Duration::from_secs(60);
        let t0 = Instant::now();

        store.write(key("old"), json!(1), t0);
        store.write(key("new"), json!(2), t0 + Duration::from_secs(30));

        assert_eq!(store.sweep(t0 + Duration::from_secs(59), ttl), 0);
        assert_eq!(store.sweep(t0 + ttl, ttl), 1);
        assert!(store.read(&key("old"), t0 + ttl).is_none());
        assert!(store.read(&key("new"), t0 + ttl).is_some());
    }
}
