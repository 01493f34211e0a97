//! In-process TTL cache
//!
//! Serialized JSON values keyed by string, with prefix invalidation so a
//! write can drop every listing derived from a table. A load that overlaps
//! an invalidation returns its value without caching it.

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Shared TTL cache; clones share storage
#[derive(Clone)]
pub struct TtlCache {
    entries: Arc<DashMap<String, Entry>>,
    /// Bumped by every invalidation
    generation: Arc<AtomicU64>,
    default_ttl: Duration,
}

impl TtlCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Cached value, if present, unexpired and of the expected shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let value = {
            let entry = self.entries.get(key)?;
            if entry.expires_at <= now {
                None
            } else {
                Some(entry.value.clone())
            }
        };
        match value {
            Some(v) => serde_json::from_value(v).ok(),
            None => {
                self.entries.remove_if(key, |_, e| e.expires_at <= now);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: impl Into<String>, value: &T, ttl: Option<Duration>) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.insert(
                    key.into(),
                    Entry {
                        value,
                        expires_at: Instant::now() + ttl.unwrap_or(self.default_ttl),
                    },
                );
            }
            Err(e) => tracing::warn!(error = %e, "Cache value not serializable, skipped"),
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.remove(key);
    }

    /// Drop every key starting with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.retain(|k, _| !k.starts_with(prefix));
    }

    /// Drop expired entries
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached value or compute, store and return it
    ///
    /// The computed value is not kept if any invalidation ran while it was
    /// loading.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        load: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key) {
            tracing::trace!(key, "cache hit");
            return Ok(hit);
        }
        let generation = self.generation.load(Ordering::SeqCst);
        let value = load().await?;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::trace!(key, "cache invalidated during load, not stored");
            return Ok(value);
        }
        self.set(key, &value, ttl);
        // An invalidation between the check and the insert may have missed it
        if self.generation.load(Ordering::SeqCst) != generation {
            self.entries.remove(key);
        }
        Ok(value)
    }
}

/// Periodic removal of expired entries
pub struct CachePurge(pub TtlCache);

#[async_trait::async_trait]
impl crate::scheduler::PeriodicJob for CachePurge {
    fn name(&self) -> &'static str {
        "cache_purge"
    }

    async fn run(&self) -> anyhow::Result<()> {
        let removed = self.0.purge_expired();
        if removed > 0 {
            tracing::debug!(removed, "Purged expired cache entries");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("settings:all", &vec![1, 2, 3], None);
        assert_eq!(cache.get::<Vec<i32>>("settings:all"), Some(vec![1, 2, 3]));

        cache.invalidate("settings:all");
        assert_eq!(cache.get::<Vec<i32>>("settings:all"), None);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("k", &"v", Some(Duration::from_millis(0)));
        assert_eq!(cache.get::<String>("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_prefix() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("products:list:1", &1, None);
        cache.set("products:list:2", &2, None);
        cache.set("categories:all", &3, None);

        cache.invalidate_prefix("products:");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<i32>("categories:all"), Some(3));
    }

    #[test]
    fn test_purge_expired() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("old", &1, Some(Duration::from_millis(0)));
        cache.set("new", &2, None);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_load_caches() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = std::sync::atomic::AtomicUsize::new(0);
        for _ in 0..3 {
            let v: Result<i32, ()> = cache
                .get_or_load("stats", None, || async {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(v, Ok(7));
        }
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_overlapping_invalidation_is_not_cached() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let v: Result<i32, ()> = cache
            .get_or_load("products:list:1", None, || async {
                // A product write lands while the listing query runs
                cache.invalidate_prefix("products:");
                Ok(1)
            })
            .await;
        assert_eq!(v, Ok(1));
        assert_eq!(cache.get::<i32>("products:list:1"), None);

        let v: Result<i32, ()> = cache
            .get_or_load("products:list:1", None, || async { Ok(2) })
            .await;
        assert_eq!(v, Ok(2));
        assert_eq!(cache.get::<i32>("products:list:1"), Some(2));
    }
}
