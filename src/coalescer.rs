//! Request Coalescer
//!
//! Deduplicates concurrent requests for the same logical resource: while a
//! fetch for a key is in flight, later callers for that key await the same
//! outcome instead of starting their own.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{GalleryError, Result};

type PendingFuture<T> = Shared<BoxFuture<'static, Result<T>>>;

struct Pending<T> {
    generation: u64,
    future: PendingFuture<T>,
}

/// Single-flight map from request key to its in-flight outcome.
///
/// The producer runs on its own tokio task, so it always runs to
/// completion and clears its pending slot even if every waiter gives up.
/// The slot is cleared before the outcome is delivered, so a failure never
/// poisons the key for the next independent call.
pub struct RequestCoalescer<T> {
    pending: Arc<Mutex<HashMap<String, Pending<T>>>>,
    generation: AtomicU64,
}

impl<T> Default for RequestCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }
}

impl<T> std::fmt::Debug for RequestCoalescer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCoalescer")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl<T> RequestCoalescer<T> {
    /// Number of keys with a fetch in flight.
    pub fn in_flight(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().contains_key(key)
    }
}

impl<T> RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the in-flight outcome for `key`, or starts `producer` and
    /// registers it as the in-flight request.
    ///
    /// `producer` is only invoked when no request for `key` is pending. The
    /// check and the registration happen under one lock acquisition.
    pub async fn coalesce<F, Fut>(&self, key: &str, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let future = {
            let mut pending = self.pending.lock();
            match pending.get(key) {
                Some(existing) => {
                    debug!(key, "Joining in-flight request");
                    existing.future.clone()
                }
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let future = self.launch(key.to_string(), generation, producer());
                    pending.insert(
                        key.to_string(),
                        Pending {
                            generation,
                            future: future.clone(),
                        },
                    );
                    future
                }
            }
        };

        future.await
    }

    fn launch<Fut>(&self, key: String, generation: u64, work: Fut) -> PendingFuture<T>
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let pending = Arc::clone(&self.pending);

        // The spawned task blocks on the map lock until the caller has
        // finished registering it, so it can never clear the slot early.
        let task = tokio::spawn(async move {
            let outcome = work.await;
            let mut map = pending.lock();
            if map.get(&key).is_some_and(|p| p.generation == generation) {
                map.remove(&key);
            }
            outcome
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => Err(GalleryError::Internal(format!(
                    "coalesced request task failed: {join_error}"
                ))),
            }
        }
        .boxed()
        .shared()
    }
}
