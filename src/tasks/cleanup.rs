//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries so
//! entries nobody reads again do not accumulate.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ApiCache;

/// Spawns a background task that calls [`ApiCache::cleanup`] every `interval`.
///
/// The task runs until aborted through the returned handle.
///
/// # Example
/// ```ignore
/// let cache: ApiCache<serde_json::Value> = ApiCache::new();
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), CLEANUP_INTERVAL);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<T>(cache: ApiCache<T>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup();

            if removed > 0 {
                info!("Cache cleanup: removed {} expired entries", removed);
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, RequestOptions};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = Arc::new(ManualClock::new());
        let cache: ApiCache<String> = ApiCache::new().with_clock(clock.clone());
        cache.set("/api/cart", "cart".to_string(), &RequestOptions::new());
        cache.set("/api/brands", "brands".to_string(), &RequestOptions::new());

        // Cart lives one minute, brands fifteen
        clock.advance(Duration::from_secs(120));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.len(), 1, "Only the expired entry should be swept");
        assert!(cache.get("/api/brands", &RequestOptions::new()).is_some());

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache: ApiCache<String> = ApiCache::new();

        let handle = spawn_cleanup_task(cache, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
