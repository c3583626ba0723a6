use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::declare_object_cache_plugin;
use crate::errors::Result;
use crate::storages::ShortLink;

declare_object_cache_plugin!("memory", MemoryObjectCache);

/// Plain in-process cache backed by a DashMap. Entries carry an absolute
/// deadline and are dropped lazily on lookup; there is no background
/// eviction, so this backend suits tests and small deployments.
pub struct MemoryObjectCache {
    entries: DashMap<String, (ShortLink, DateTime<Utc>)>,
}

impl MemoryObjectCache {
    pub async fn new_async() -> Result<Self> {
        debug!("MemoryObjectCache initialized");
        Ok(Self {
            entries: DashMap::new(),
        })
    }
}

#[async_trait]
impl ObjectCache for MemoryObjectCache {
    async fn get(&self, key: &str) -> CacheResult {
        match self.entries.get(key) {
            Some(entry) => {
                let (link, deadline) = entry.value();
                if *deadline <= Utc::now() {
                    drop(entry);
                    self.entries.remove(key);
                    CacheResult::Miss
                } else {
                    CacheResult::Found(link.clone())
                }
            }
            None => CacheResult::Miss,
        }
    }

    async fn insert(&self, key: &str, value: ShortLink, ttl_secs: u64) {
        let deadline = Utc::now() + Duration::seconds(ttl_secs as i64);
        self.entries.insert(key.to_string(), (value, deadline));
    }

    async fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn invalidate_all(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_link(code: &str) -> ShortLink {
        ShortLink {
            code: code.to_string(),
            target: "https://example.com/page".to_string(),
            created_at: Utc::now(),
            expires_at: None,
            alias_requested: false,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = MemoryObjectCache::new_async().await.unwrap();
        cache.insert("abc", sample_link("abc"), 60).await;

        match cache.get("abc").await {
            CacheResult::Found(link) => assert_eq!(link.code, "abc"),
            CacheResult::Miss => panic!("expected cache hit"),
        }
    }

    #[tokio::test]
    async fn test_zero_ttl_entry_is_a_miss() {
        let cache = MemoryObjectCache::new_async().await.unwrap();
        cache.insert("abc", sample_link("abc"), 0).await;
        assert!(matches!(cache.get("abc").await, CacheResult::Miss));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let cache = MemoryObjectCache::new_async().await.unwrap();
        cache.insert("abc", sample_link("abc"), 60).await;
        cache.remove("abc").await;
        cache.remove("abc").await;
        assert!(matches!(cache.get("abc").await, CacheResult::Miss));
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = MemoryObjectCache::new_async().await.unwrap();
        cache.insert("a", sample_link("a"), 60).await;
        cache.insert("b", sample_link("b"), 60).await;
        cache.invalidate_all().await;
        assert!(matches!(cache.get("a").await, CacheResult::Miss));
        assert!(matches!(cache.get("b").await, CacheResult::Miss));
    }
}
