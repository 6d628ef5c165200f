//! Cache Module
//!
//! Provides in-memory caching with per-entry TTL expiration and LRU eviction.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use shared::SharedCache;
pub use stats::{CacheStats, Counters};
pub use store::CacheStore;
