//! Thread-safe cache handle.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{CacheStats, CacheStore};

/// Cloneable, thread-safe handle over a [`CacheStore`].
///
/// Every operation takes the lock for its whole duration, so eviction,
/// expiry and size accounting are atomic per call. Operations never await,
/// which is why a blocking mutex is used instead of an async one.
#[derive(Debug)]
pub struct SharedCache<V> {
    inner: Arc<Mutex<CacheStore<V>>>,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> SharedCache<V> {
    pub fn new(max_entries: usize) -> Self {
        Self::from_store(CacheStore::new(max_entries))
    }

    pub fn from_store(store: CacheStore<V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key)
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.inner.lock().set(key, value, ttl);
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().has(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().delete(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    pub fn cleanup_expired(&self) -> usize {
        self.inner.lock().cleanup_expired()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
