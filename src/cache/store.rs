//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Counters, LruTracker};

// == Cache Store ==
/// Size-bounded cache storage with LRU eviction and per-entry TTL.
///
/// Not synchronized; see [`SharedCache`](crate::cache::SharedCache) for the
/// thread-safe handle.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    counters: Counters,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `max_entries` entries.
    ///
    /// A capacity of zero yields a store that accepts writes and silently
    /// drops them.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            counters: Counters::default(),
            max_entries,
        }
    }

    // == Set ==
    /// Stores a value under `key`. `ttl = None` means the entry never expires.
    ///
    /// If the key already exists, the value is overwritten and its TTL reset.
    /// If the cache is at capacity, the least recently used entry is evicted.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();

        if self.max_entries == 0 {
            debug!(key = %key, "Cache disabled (capacity 0), dropping write");
            return;
        }

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.max_entries {
                match self.lru.evict_oldest() {
                    Some(evicted) => {
                        self.entries.remove(&evicted);
                        self.counters.evictions += 1;
                        debug!(evicted = %evicted, "LRU eviction");
                    }
                    None => break,
                }
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, ttl));
        self.lru.touch(&key);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Absent and expired keys are both misses; an expired entry is removed
    /// as a side effect. A hit refreshes the entry's recency.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get_mut(key) {
            None => {
                self.counters.misses += 1;
                return None;
            }
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                entry.touch();
                let value = entry.value.clone();
                self.counters.hits += 1;
                self.lru.touch(key);
                return Some(value);
            }
        };

        if expired {
            self.remove_entry(key);
        }
        self.counters.misses += 1;
        None
    }

    // == Has ==
    /// Presence check with the same side effects as [`get`](Self::get):
    /// it counts as a hit or miss, refreshes recency and purges expired
    /// entries, keeping hit/miss accounting consistent with lookups.
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Clear ==
    /// Drops every entry and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.counters = Counters::default();
    }

    // == Stats ==
    /// Returns a snapshot of the cache.
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();

        let stored = self.entries.values().map(|entry| entry.stored_at_utc);

        CacheStats {
            size: self.entries.len(),
            max_size: self.max_entries,
            hit_rate: self.counters.hit_rate(),
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
            keys,
            oldest_entry: stored.clone().min(),
            newest_entry: stored.max(),
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed. Entries without a TTL are
    /// never touched here.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }
        expired_keys.len()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Read-only view of an entry's metadata, without touching recency.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }
}
