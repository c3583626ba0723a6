use async_trait::async_trait;

use crate::cache::{CacheResult, ObjectCache};
use crate::declare_object_cache_plugin;
use crate::errors::Result;
use crate::storages::ShortLink;

declare_object_cache_plugin!("null", NullObjectCache);

/// No-op cache: every lookup is a miss, every write is discarded. Useful
/// for tests and for deployments that want the persistence gateway to be
/// the only source of truth.
pub struct NullObjectCache;

impl NullObjectCache {
    pub async fn new_async() -> Result<Self> {
        Ok(Self)
    }
}

#[async_trait]
impl ObjectCache for NullObjectCache {
    async fn get(&self, _key: &str) -> CacheResult {
        CacheResult::Miss
    }

    async fn insert(&self, _key: &str, _value: ShortLink, _ttl_secs: u64) {}

    async fn remove(&self, _key: &str) {}

    async fn invalidate_all(&self) {}
}
