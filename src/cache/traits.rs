use crate::storages::ShortLink;
use async_trait::async_trait;

/// Cache lookup result. A miss means "consult the persistence gateway",
/// never "does not exist".
#[derive(Debug, Clone)]
pub enum CacheResult {
    Miss,
    Found(ShortLink),
}

/// Advisory cache of code -> link. Entries may be evicted at any moment and
/// correctness never depends on their presence; the TTL handed to `insert`
/// is already bounded by the record's remaining lifetime so the cache can
/// never outlive the link it holds.
///
/// Cache failures are swallowed by implementations (logged, degraded to a
/// miss or a no-op); the cache must not become a point of failure.
#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult;
    async fn insert(&self, key: &str, value: ShortLink, ttl_secs: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}
