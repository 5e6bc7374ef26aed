// Query cache module
// Author: kelexine (https://github.com/kelexine)

pub mod key;
pub mod manager;
pub mod models;
pub mod store;

pub use key::CacheKey;
pub use manager::QueryCache;
pub use models::{CacheConfig, CacheStats, CachedValue};
pub use store::{CacheStore, MemoryStore, TimestampedStore};
