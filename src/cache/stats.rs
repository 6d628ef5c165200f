//! Cache Statistics Module
//!
//! Tracks cache performance counters and the introspection snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Counters ==
/// Hit/miss/eviction counters since creation or the last `clear`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl Counters {
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of the cache.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Live keys, sorted
    pub keys: Vec<String>,
    /// Insertion time of the oldest live entry
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Insertion time of the newest live entry
    pub newest_entry: Option<DateTime<Utc>>,
}
