//! In-process storage backend.
//!
//! Used by tests and single-node deployments that can tolerate losing links
//! on restart. The DashMap entry API gives `put_if_absent` its atomicity:
//! the shard lock is held from the liveness check through the insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{ShortLink, Storage};
use crate::errors::{Result, ShortloopError};

#[derive(Default)]
pub struct MemoryStorage {
    inner: DashMap<String, ShortLink>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, code: &str) -> Result<Option<ShortLink>> {
        Ok(self.inner.get(code).map(|entry| entry.value().clone()))
    }

    async fn put_if_absent(&self, link: ShortLink, now: DateTime<Utc>) -> Result<()> {
        match self.inner.entry(link.code.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    // expired codes are reusable
                    occupied.insert(link);
                    Ok(())
                } else {
                    Err(ShortloopError::conflict(format!(
                        "Code '{}' already exists",
                        occupied.key()
                    )))
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(link);
                Ok(())
            }
        }
    }

    async fn remove(&self, code: &str) -> Result<()> {
        self.inner.remove(code);
        Ok(())
    }

    async fn backend_name(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(code: &str, expires_in: Option<Duration>) -> ShortLink {
        let now = Utc::now();
        ShortLink {
            code: code.to_string(),
            target: "https://example.com".to_string(),
            created_at: now,
            expires_at: expires_in.map(|d| now + d),
            alias_requested: false,
        }
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let storage = MemoryStorage::new();
        let stored = link("abc", None);
        storage.put_if_absent(stored.clone(), Utc::now()).await.unwrap();

        let fetched = storage.get("abc").await.unwrap();
        assert_eq!(fetched, Some(stored));
    }

    #[tokio::test]
    async fn test_put_if_absent_conflict_on_live_record() {
        let storage = MemoryStorage::new();
        storage
            .put_if_absent(link("abc", Some(Duration::hours(1))), Utc::now())
            .await
            .unwrap();

        let err = storage
            .put_if_absent(link("abc", None), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ShortloopError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_put_if_absent_replaces_expired_record() {
        let storage = MemoryStorage::new();
        let old = link("abc", Some(Duration::seconds(10)));
        storage.put_if_absent(old.clone(), Utc::now()).await.unwrap();

        let later = old.expires_at.unwrap() + Duration::seconds(1);
        let replacement = link("abc", None);
        storage
            .put_if_absent(replacement.clone(), later)
            .await
            .unwrap();

        assert_eq!(storage.get("abc").await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn test_get_returns_expired_records() {
        let storage = MemoryStorage::new();
        let stored = link("abc", Some(Duration::seconds(10)));
        storage.put_if_absent(stored.clone(), Utc::now()).await.unwrap();

        // expiry interpretation belongs to the resolver, not the gateway
        assert_eq!(storage.get("abc").await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.put_if_absent(link("abc", None), Utc::now()).await.unwrap();

        storage.remove("abc").await.unwrap();
        assert_eq!(storage.get("abc").await.unwrap(), None);
        storage.remove("abc").await.unwrap();
        storage.remove("never-existed").await.unwrap();
    }
}
