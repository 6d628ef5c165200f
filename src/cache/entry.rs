//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
///
/// Expiry is measured on the monotonic clock; the wall-clock timestamps are
/// kept for reporting only.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Monotonic insertion instant
    pub stored_at: Instant,
    /// Wall-clock insertion time
    pub stored_at_utc: DateTime<Utc>,
    /// Time to live, None = never expires
    pub ttl: Option<Duration>,
    /// Number of hits served by this entry
    pub access_count: u64,
    /// Wall-clock time of the last hit (or insertion)
    pub last_accessed_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        Self {
            value,
            stored_at: Instant::now(),
            stored_at_utc: now,
            ttl,
            access_count: 0,
            last_accessed_at: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once strictly more than `ttl` has elapsed since
    /// it was stored. Entries without a TTL never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.stored_at) > ttl,
            None => false,
        }
    }

    // == Touch ==
    /// Records a hit.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = Utc::now();
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if the entry never expires.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.ttl
            .map(|ttl| ttl.saturating_sub(self.stored_at.elapsed()))
    }
}
