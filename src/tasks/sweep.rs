//! TTL Expiry Sweep
//!
//! Background task that periodically removes expired cache entries. The
//! lookup path already discards expired entries on access; the sweep only
//! reclaims memory held by entries nobody asks for anymore.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Owner of a running sweep task.
///
/// Call [`shutdown`](Self::shutdown) to stop it gracefully; dropping the
/// handle aborts the task.
#[derive(Debug)]
pub struct SweepHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Stops the sweep and waits for the task to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The first sweep runs one full interval after spawning. The cache lock
/// is only held for the duration of each sweep, never across the sleep.
///
/// # Example
/// ```ignore
/// let cache = SharedCache::new(1000);
/// let sweep = spawn_sweep_task(cache.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// sweep.shutdown().await;
/// ```
pub fn spawn_sweep_task<V>(cache: SharedCache<V>, interval: Duration) -> SweepHandle
where
    V: Clone + Send + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let period = interval.max(Duration::from_millis(1));

    let task = tokio::spawn(async move {
        info!(interval_ms = period.as_millis() as u64, "Starting cache expiry sweep");

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    info!("Cache expiry sweep stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = cache.cleanup_expired();
                    if removed > 0 {
                        info!(removed, "Expiry sweep removed expired entries");
                    } else {
                        debug!("Expiry sweep found no expired entries");
                    }
                }
            }
        }
    });

    SweepHandle {
        stop: Some(stop_tx),
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let cache: SharedCache<String> = SharedCache::new(100);
        cache.set("expire_soon", "value".to_string(), Some(Duration::from_millis(50)));

        let sweep = spawn_sweep_task(cache.clone(), Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(350)).await;

        // Checked without get() so the lookup path cannot be what removed it.
        assert!(!cache.stats().keys.contains(&"expire_soon".to_string()));
        sweep.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweep_preserves_valid_and_infinite_entries() {
        let cache: SharedCache<String> = SharedCache::new(100);
        cache.set("long_lived", "value".to_string(), Some(Duration::from_secs(3600)));
        cache.set("exif:forever", "value".to_string(), None);

        let sweep = spawn_sweep_task(cache.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.get("long_lived"), Some("value".to_string()));
        assert_eq!(cache.get("exif:forever"), Some("value".to_string()));
        sweep.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let cache: SharedCache<u8> = SharedCache::new(10);
        let sweep = spawn_sweep_task(cache, Duration::from_secs(300));

        assert!(!sweep.is_finished());
        tokio::time::timeout(Duration::from_secs(1), sweep.shutdown())
            .await
            .expect("shutdown should not wait for the next tick");
    }

    #[tokio::test]
    async fn test_drop_aborts_task() {
        let cache: SharedCache<u8> = SharedCache::new(10);
        cache.set("k", 1, Some(Duration::from_millis(10)));

        let sweep = spawn_sweep_task(cache.clone(), Duration::from_millis(500));
        drop(sweep);
        tokio::time::sleep(Duration::from_millis(700)).await;

        // No sweep ran, so the expired entry is still physically present.
        assert_eq!(cache.len(), 1);
    }
}
