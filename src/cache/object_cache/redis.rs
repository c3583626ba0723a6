use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, trace, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::declare_object_cache_plugin;
use crate::errors::{Result, ShortloopError};
use crate::storages::ShortLink;

declare_object_cache_plugin!("redis", RedisObjectCache);

/// Shared cache over Redis, for multi-instance deployments. All failures
/// degrade to a miss or a dropped write; the resolver never sees a Redis
/// error.
pub struct RedisObjectCache {
    client: redis::Client,
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisObjectCache {
    pub async fn new_async() -> Result<Self> {
        let config = crate::config::get_config();
        let redis_url = config.cache.redis_url.clone();
        let key_prefix = config.cache.redis_key_prefix.clone();

        let client = redis::Client::open(redis_url.clone()).map_err(|e| {
            ShortloopError::cache_connection(format!(
                "Failed to create Redis client for '{}': {}",
                redis_url, e
            ))
        })?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                ShortloopError::cache_connection(format!(
                    "Failed to connect to Redis at '{}': {}",
                    redis_url, e
                ))
            })?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await.map_err(|e| {
            ShortloopError::cache_connection(format!("Redis ping failed: {}", e))
        })?;
        debug!("Redis connection test successful: {}", pong);

        debug!("RedisObjectCache created with prefix: '{}'", key_prefix);

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(Some(conn))),
            key_prefix,
        })
    }

    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // Another task may have reconnected while we waited for the lock.
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn serialize_link(link: &ShortLink) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(link)
    }

    fn deserialize_link(data: &str) -> std::result::Result<ShortLink, serde_json::Error> {
        serde_json::from_str(data)
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get(&self, key: &str) -> CacheResult {
        let redis_key = self.make_key(key);

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                return CacheResult::Miss;
            }
        };

        let result: redis::RedisResult<Option<String>> = conn.get(&redis_key).await;

        match result {
            Ok(Some(data)) => match Self::deserialize_link(&data) {
                Ok(link) => {
                    trace!("Successfully retrieved key: {}", key);
                    CacheResult::Found(link)
                }
                Err(e) => {
                    error!("Failed to deserialize ShortLink for key '{}': {}", key, e);
                    CacheResult::Miss
                }
            },
            Ok(None) => {
                trace!("Key not found in cache: {}", key);
                CacheResult::Miss
            }
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                self.reset_connection().await;
                CacheResult::Miss
            }
        }
    }

    async fn insert(&self, key: &str, value: ShortLink, ttl_secs: u64) {
        if ttl_secs == 0 {
            return;
        }
        let redis_key = self.make_key(key);

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                return;
            }
        };

        match Self::serialize_link(&value) {
            Ok(serialized_value) => {
                match conn
                    .set_ex::<String, String, ()>(redis_key, serialized_value, ttl_secs)
                    .await
                {
                    Ok(_) => {
                        trace!("Successfully inserted key into cache: {}", key);
                    }
                    Err(e) => {
                        error!("Failed to insert key '{}' into cache: {}", key, e);
                        self.reset_connection().await;
                    }
                }
            }
            Err(e) => {
                error!("Failed to serialize ShortLink for key '{}': {}", key, e);
            }
        }
    }

    async fn remove(&self, key: &str) {
        let redis_key = self.make_key(key);

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                return;
            }
        };

        match conn.del::<String, i32>(redis_key).await {
            Ok(deleted_count) => {
                if deleted_count > 0 {
                    trace!("Successfully removed key from cache: {}", key);
                } else {
                    trace!("Key not found in cache for removal: {}", key);
                }
            }
            Err(e) => {
                error!("Failed to remove key '{}': {}", key, e);
                self.reset_connection().await;
            }
        }
    }

    async fn invalidate_all(&self) {
        warn!("RedisObjectCache does not implement invalidate_all");
    }
}
