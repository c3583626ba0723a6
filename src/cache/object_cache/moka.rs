use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::declare_object_cache_plugin;
use crate::errors::Result;
use crate::storages::ShortLink;

declare_object_cache_plugin!("moka", MokaObjectCache);

/// Per-entry expiry derived from the link itself: an expiring link never
/// stays cached past its `expires_at`, a permanent link uses the default
/// TTL. This keeps the cache bound honest even if a caller hands us a
/// sloppy TTL.
struct ShortLinkExpiry {
    default_ttl: Duration,
}

impl Expiry<String, ShortLink> for ShortLinkExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &ShortLink,
        _created_at: Instant,
    ) -> Option<Duration> {
        match value.expires_at {
            Some(expires_at) => {
                let now = chrono::Utc::now();
                if expires_at <= now {
                    Some(Duration::from_secs(1))
                } else {
                    let remaining = (expires_at - now).num_seconds() as u64;
                    Some(Duration::from_secs(
                        remaining.min(self.default_ttl.as_secs()),
                    ))
                }
            }
            None => Some(self.default_ttl),
        }
    }
}

pub struct MokaObjectCache {
    inner: Cache<String, ShortLink>,
}

impl MokaObjectCache {
    pub async fn new_async() -> Result<Self> {
        let config = crate::config::get_config();
        let default_ttl = Duration::from_secs(config.cache.default_ttl);

        let inner = Cache::builder()
            .max_capacity(config.cache.memory_max_capacity)
            .expire_after(ShortLinkExpiry { default_ttl })
            .build();

        debug!(
            "MokaObjectCache initialized with max capacity: {}, default TTL: {}s",
            config.cache.memory_max_capacity, config.cache.default_ttl
        );
        Ok(Self { inner })
    }
}

#[async_trait]
impl ObjectCache for MokaObjectCache {
    async fn get(&self, key: &str) -> CacheResult {
        if let Some(value) = self.inner.get(key).await {
            CacheResult::Found(value.clone())
        } else {
            CacheResult::Miss
        }
    }

    async fn insert(&self, key: &str, value: ShortLink, _ttl_secs: u64) {
        // ttl_secs is ignored; the Expiry policy derives the TTL from
        // value.expires_at directly.
        self.inner.insert(key.to_string(), value).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_link(code: &str, expires_at: Option<chrono::DateTime<Utc>>) -> ShortLink {
        ShortLink {
            code: code.to_string(),
            target: "https://example.com/page".to_string(),
            created_at: Utc::now(),
            expires_at,
            alias_requested: false,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = MokaObjectCache::new_async().await.unwrap();
        cache.insert("abc", sample_link("abc", None), 60).await;

        match cache.get("abc").await {
            CacheResult::Found(link) => assert_eq!(link.target, "https://example.com/page"),
            CacheResult::Miss => panic!("expected cache hit"),
        }
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = MokaObjectCache::new_async().await.unwrap();
        cache.insert("abc", sample_link("abc", None), 60).await;
        cache.remove("abc").await;
        assert!(matches!(cache.get("abc").await, CacheResult::Miss));
    }

    #[test]
    fn test_expiry_caps_at_remaining_lifetime() {
        let expiry = ShortLinkExpiry {
            default_ttl: Duration::from_secs(3600),
        };
        let link = sample_link("abc", Some(Utc::now() + chrono::Duration::seconds(30)));
        let ttl = expiry
            .expire_after_create(&"abc".to_string(), &link, Instant::now())
            .unwrap();
        assert!(ttl <= Duration::from_secs(30));
    }

    #[test]
    fn test_expiry_uses_default_for_permanent_links() {
        let expiry = ShortLinkExpiry {
            default_ttl: Duration::from_secs(3600),
        };
        let link = sample_link("abc", None);
        let ttl = expiry
            .expire_after_create(&"abc".to_string(), &link, Instant::now())
            .unwrap();
        assert_eq!(ttl, Duration::from_secs(3600));
    }
}
