//! Envelope storage behind the stale-while-revalidate cache.
//!
//! # Responsibilities
//! - Hold one `CacheEnvelope` per key
//! - Replace envelopes atomically (no reader sees a half-written entry)
//! - Keep `check_after` monotonically non-decreasing per key

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// A cached value together with its freshness window.
///
/// The payload lives behind an `Arc` so concurrent requests share one
/// immutable copy instead of cloning the data per request.
#[derive(Debug)]
pub struct CacheEnvelope<T> {
    /// The cached payload.
    pub data: Arc<T>,
    /// When the envelope was created.
    pub cached_at: Instant,
    /// Once `now >= check_after` the entry is served stale and refreshed
    /// in the background.
    pub check_after: Instant,
}

impl<T> CacheEnvelope<T> {
    /// Wrap a freshly produced value with a TTL-bounded freshness window.
    pub fn new(data: T, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data: Arc::new(data),
            cached_at: now,
            check_after: now + ttl,
        }
    }

    /// Whether the envelope is past its freshness window.
    pub fn is_stale(&self) -> bool {
        Instant::now() >= self.check_after
    }
}

impl<T> Clone for CacheEnvelope<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            cached_at: self.cached_at,
            check_after: self.check_after,
        }
    }
}

/// Keyed envelope storage.
///
/// Injected into `SwrCache` so callers control the backing store.
pub trait CacheStore<T>: Send + Sync {
    /// Get the envelope for a key, if any.
    fn get(&self, key: &str) -> Option<CacheEnvelope<T>>;

    /// Replace the envelope for a key.
    ///
    /// Implementations must not let `check_after` move backwards for a key.
    fn set(&self, key: &str, envelope: CacheEnvelope<T>);

    /// Whether a key currently holds an envelope.
    fn has(&self, key: &str) -> bool;
}

/// Thread-safe in-memory store backed by a `DashMap`.
#[derive(Default)]
pub struct InMemoryCacheStore<T> {
    inner: DashMap<String, CacheEnvelope<T>>,
}

impl<T> InMemoryCacheStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Number of stored envelopes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Send + Sync> CacheStore<T> for InMemoryCacheStore<T> {
    fn get(&self, key: &str) -> Option<CacheEnvelope<T>> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, mut envelope: CacheEnvelope<T>) {
        match self.inner.entry(key.to_string()) {
            Entry::Occupied(mut slot) => {
                // check_after never moves backwards for a key
                if envelope.check_after < slot.get().check_after {
                    envelope.check_after = slot.get().check_after;
                }
                slot.insert(envelope);
            }
            Entry::Vacant(slot) => {
                slot.insert(envelope);
            }
        }
    }

    fn has(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_replacement_is_whole() {
        let store = InMemoryCacheStore::new();
        store.set("k", CacheEnvelope::new(1u32, Duration::from_secs(60)));
        store.set("k", CacheEnvelope::new(2u32, Duration::from_secs(60)));

        let envelope = store.get("k").unwrap();
        assert_eq!(*envelope.data, 2);
        assert!(!envelope.is_stale());
    }

    #[test]
    fn test_check_after_is_monotonic() {
        let store = InMemoryCacheStore::new();
        store.set("k", CacheEnvelope::new(1u32, Duration::from_secs(600)));
        let first = store.get("k").unwrap().check_after;

        // A shorter TTL must not pull the freshness window backwards.
        store.set("k", CacheEnvelope::new(2u32, Duration::from_secs(1)));
        let second = store.get("k").unwrap().check_after;
        assert!(second >= first);
        assert_eq!(*store.get("k").unwrap().data, 2);
    }

    #[test]
    fn test_has() {
        let store: InMemoryCacheStore<u32> = InMemoryCacheStore::new();
        assert!(!store.has("k"));
        store.set("k", CacheEnvelope::new(1, Duration::from_secs(1)));
        assert!(store.has("k"));
    }
}
