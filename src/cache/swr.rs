//! Stale-while-revalidate memoization over an async producer.
//!
//! # Responsibilities
//! - Serve fresh hits without I/O
//! - Serve stale hits immediately and refresh in the background
//! - Deduplicate refreshes triggered by concurrently expiring readers
//! - Coalesce cold fetches so one producer call fills the key
//!
//! # Design Decisions
//! - Background refresh failures never surface to callers: the stale
//!   envelope keeps being served until a refresh succeeds
//! - Refreshes run on detached tasks and are not cancelled when the
//!   triggering request aborts

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use tokio::sync::Mutex;

use crate::cache::store::{CacheEnvelope, CacheStore};
use crate::observability::metrics;

/// Boxed future returned by a cache producer.
pub type ProducerFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Async producer invoked on cold fetches and background refreshes.
pub type Producer<T, E> = Arc<dyn Fn(String) -> ProducerFuture<T, E> + Send + Sync>;

/// Options for a stale-while-revalidate cache.
#[derive(Debug, Clone)]
pub struct SwrOptions {
    /// Cache name, used for logs and metrics.
    pub name: &'static str,
    /// Freshness window per key.
    pub ttl: Duration,
}

struct Inner<T, E> {
    options: SwrOptions,
    store: Arc<dyn CacheStore<T>>,
    producer: Producer<T, E>,
    /// Per-key locks so concurrent cold fetches run the producer once.
    cold_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Keys with a background refresh in flight.
    refreshing: DashSet<String>,
}

/// Stale-while-revalidate cache over a keyed async producer.
pub struct SwrCache<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for SwrCache<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> SwrCache<T, E>
where
    T: Send + Sync + 'static,
    E: Display + Send + 'static,
{
    /// Create a cache over the given store and producer.
    pub fn new(options: SwrOptions, store: Arc<dyn CacheStore<T>>, producer: Producer<T, E>) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                store,
                producer,
                cold_locks: DashMap::new(),
                refreshing: DashSet::new(),
            }),
        }
    }

    /// Get the value for a key.
    ///
    /// Fresh hits return without I/O. Stale hits return the cached value
    /// immediately and trigger one background refresh. Cold keys run the
    /// producer inline; a cold failure propagates and caches nothing.
    pub async fn get(&self, key: &str) -> Result<Arc<T>, E> {
        if let Some(envelope) = self.inner.store.get(key) {
            if !envelope.is_stale() {
                metrics::record_cache_event(self.inner.options.name, "hit");
                return Ok(envelope.data);
            }
            metrics::record_cache_event(self.inner.options.name, "stale");
            self.spawn_refresh(key);
            return Ok(envelope.data);
        }

        // Cold path: coalesce concurrent callers behind a per-key lock.
        let lock = self
            .inner
            .cold_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have populated the key while we waited.
        if let Some(envelope) = self.inner.store.get(key) {
            metrics::record_cache_event(self.inner.options.name, "hit");
            return Ok(envelope.data);
        }

        metrics::record_cache_event(self.inner.options.name, "miss");
        let result = (self.inner.producer)(key.to_string()).await;

        // Drop the coalescing entry whether the fetch filled the key or
        // failed. Keys can be request-derived, so entries must not
        // accumulate per distinct key.
        self.inner
            .cold_locks
            .remove_if(key, |_, entry| Arc::ptr_eq(entry, &lock));

        let data = result?;
        let envelope = CacheEnvelope::new(data, self.inner.options.ttl);
        let shared = Arc::clone(&envelope.data);
        self.inner.store.set(key, envelope);
        Ok(shared)
    }

    /// Whether a key is currently populated.
    pub fn has(&self, key: &str) -> bool {
        self.inner.store.has(key)
    }

    /// Spawn one background refresh per expiry event.
    ///
    /// Concurrent stale readers race on the in-flight set; only the winner
    /// spawns the refresh task.
    fn spawn_refresh(&self, key: &str) {
        if !self.inner.refreshing.insert(key.to_string()) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        tokio::spawn(async move {
            match (inner.producer)(key.clone()).await {
                Ok(data) => {
                    inner
                        .store
                        .set(&key, CacheEnvelope::new(data, inner.options.ttl));
                    tracing::debug!(cache = inner.options.name, key = %key, "cache refreshed");
                }
                Err(error) => {
                    // Keep serving the stale envelope; do not evict.
                    metrics::record_cache_event(inner.options.name, "refresh_failed");
                    tracing::warn!(
                        cache = inner.options.name,
                        key = %key,
                        error = %error,
                        "background refresh failed, serving stale data"
                    );
                }
            }
            inner.refreshing.remove(&key);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::InMemoryCacheStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_cache(
        ttl: Duration,
        fail_after_first: bool,
    ) -> (SwrCache<u32, String>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_producer = calls.clone();
        let producer: Producer<u32, String> = Arc::new(move |_key| {
            let calls = calls_in_producer.clone();
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if fail_after_first && n > 1 {
                    Err("backing source down".to_string())
                } else {
                    Ok(n)
                }
            })
        });
        let cache = SwrCache::new(
            SwrOptions { name: "test", ttl },
            Arc::new(InMemoryCacheStore::new()),
            producer,
        );
        (cache, calls)
    }

    #[tokio::test]
    async fn test_fresh_hits_trigger_one_fetch() {
        let (cache, calls) = counting_cache(Duration::from_secs(60), false);

        assert_eq!(*cache.get("k").await.unwrap(), 1);
        assert_eq!(*cache.get("k").await.unwrap(), 1);
        assert_eq!(*cache.get("k").await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_value_served_then_refreshed() {
        let (cache, calls) = counting_cache(Duration::from_millis(30), false);

        assert_eq!(*cache.get("k").await.unwrap(), 1);
        tokio::time::sleep(Duration::from_millis(60)).await;

        // First call past expiry returns the pre-expiry value synchronously.
        assert_eq!(*cache.get("k").await.unwrap(), 1);

        // Once the background fetch resolves, the refreshed value is served.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*cache.get("k").await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_expiry_triggers_one_refresh() {
        let (cache, calls) = counting_cache(Duration::from_millis(30), false);
        cache.get("k").await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        for _ in 0..10 {
            assert_eq!(*cache.get("k").await.unwrap(), 1);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Ten stale readers, exactly one refresh.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_serving_stale() {
        let (cache, calls) = counting_cache(Duration::from_millis(30), true);
        assert_eq!(*cache.get("k").await.unwrap(), 1);
        tokio::time::sleep(Duration::from_millis(60)).await;

        // No caller ever observes the refresh failure.
        assert_eq!(*cache.get("k").await.unwrap(), 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*cache.get("k").await.unwrap(), 1);
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_cold_failure_propagates_and_caches_nothing() {
        let producer: Producer<u32, String> =
            Arc::new(|_key| Box::pin(async { Err("boom".to_string()) }));
        let cache = SwrCache::new(
            SwrOptions {
                name: "test",
                ttl: Duration::from_secs(60),
            },
            Arc::new(InMemoryCacheStore::new()),
            producer,
        );

        assert_eq!(cache.get("k").await.unwrap_err(), "boom");
        assert!(!cache.has("k"));
    }

    #[tokio::test]
    async fn test_cold_lock_entries_do_not_accumulate() {
        let (cache, _) = counting_cache(Duration::from_secs(60), false);
        cache.get("k").await.unwrap();
        assert!(cache.inner.cold_locks.is_empty());

        // Failed fetches over request-derived keys must not grow the map.
        let producer: Producer<u32, String> =
            Arc::new(|_key| Box::pin(async { Err("backing source down".to_string()) }));
        let cache = SwrCache::new(
            SwrOptions {
                name: "test",
                ttl: Duration::from_secs(60),
            },
            Arc::new(InMemoryCacheStore::new()),
            producer,
        );
        for n in 0..32 {
            cache.get(&format!("host-{n}.example.com")).await.unwrap_err();
        }
        assert!(cache.inner.cold_locks.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_cold_fetches_coalesce() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_producer = calls.clone();
        let producer: Producer<u32, String> = Arc::new(move |_key| {
            let calls = calls_in_producer.clone();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
            })
        });
        let cache = SwrCache::new(
            SwrOptions {
                name: "test",
                ttl: Duration::from_secs(60),
            },
            Arc::new(InMemoryCacheStore::new()),
            producer,
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { *cache.get("k").await.unwrap() }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
