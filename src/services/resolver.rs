//! The link resolution engine: creation, resolution and deletion of short
//! links over a persistence gateway and an advisory cache.
//!
//! Correctness rests on two rules. The gateway's atomic `put_if_absent` is
//! the only ordering point for code allocation, so any number of resolver
//! instances can run side by side without coordination. And the cache is
//! advisory: a stale or missing entry is always resolved against the
//! gateway, never trusted past the link's own `expires_at`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::Config;
use crate::errors::{Result, ShortloopError};
use crate::storages::retry::{RetryConfig, with_retry_timeout};
use crate::storages::{ShortLink, Storage};
use crate::utils::{Clock, CodeGenerator, validate_alias, validate_url};

/// Inputs for link creation, already decoded from the transport layer.
#[derive(Debug, Clone)]
pub struct CreateLinkRequest {
    pub target: String,
    /// Caller-chosen code. `None` means "allocate a random one".
    pub alias: Option<String>,
    /// Absolute expiry; must be strictly in the future. `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct LinkResolver {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn ObjectCache>,
    generator: Arc<dyn CodeGenerator>,
    clock: Arc<dyn Clock>,
    default_ttl: u64,
    max_code_attempts: u32,
    retry: RetryConfig,
    store_timeout_ms: u64,
    cache_timeout_ms: u64,
}

impl LinkResolver {
    pub fn new(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn ObjectCache>,
        generator: Arc<dyn CodeGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_config(storage, cache, generator, clock, crate::config::get_config())
    }

    pub fn with_config(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn ObjectCache>,
        generator: Arc<dyn CodeGenerator>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        Self {
            storage,
            cache,
            generator,
            clock,
            default_ttl: config.cache.default_ttl,
            max_code_attempts: config.resolver.max_code_attempts,
            retry: RetryConfig::from_config(&config.resolver),
            store_timeout_ms: config.resolver.store_timeout_ms,
            cache_timeout_ms: config.resolver.cache_timeout_ms,
        }
    }

    /// Create a short link and return the stored record.
    ///
    /// An alias gets exactly one insert attempt: a conflict means the name
    /// is taken, and the caller picks another. Generated codes absorb
    /// conflicts by drawing a fresh code, up to `max_code_attempts`.
    pub async fn create_link(&self, request: CreateLinkRequest) -> Result<ShortLink> {
        validate_url(&request.target).map_err(|e| ShortloopError::invalid_url(e.to_string()))?;

        let now = self.clock.now();
        if let Some(expires_at) = request.expires_at {
            if expires_at <= now {
                return Err(ShortloopError::invalid_expiry(format!(
                    "Expiration time {} is not in the future",
                    expires_at.to_rfc3339()
                )));
            }
        }

        let link = match request.alias {
            Some(alias) => {
                validate_alias(&alias).map_err(|e| ShortloopError::invalid_alias(e.to_string()))?;

                let link = ShortLink {
                    code: alias,
                    target: request.target,
                    created_at: now,
                    expires_at: request.expires_at,
                    alias_requested: true,
                };

                match self.store_link(link.clone(), now).await {
                    Ok(()) => link,
                    Err(ShortloopError::Conflict(_)) => {
                        return Err(ShortloopError::alias_taken(format!(
                            "Alias '{}' is already in use",
                            link.code
                        )));
                    }
                    Err(e) => return Err(e),
                }
            }
            None => self.create_with_generated_code(&request.target, request.expires_at, now).await?,
        };

        self.cache_populate(&link, now).await;

        info!(
            code = %link.code,
            alias_requested = link.alias_requested,
            expires_at = ?link.expires_at,
            "Short link created"
        );
        Ok(link)
    }

    async fn create_with_generated_code(
        &self,
        target: &str,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<ShortLink> {
        for attempt in 1..=self.max_code_attempts {
            let link = ShortLink {
                code: self.generator.generate(),
                target: target.to_string(),
                created_at: now,
                expires_at,
                alias_requested: false,
            };

            match self.store_link(link.clone(), now).await {
                Ok(()) => return Ok(link),
                Err(ShortloopError::Conflict(_)) => {
                    debug!(
                        code = %link.code,
                        attempt,
                        "Generated code collided, drawing a fresh one"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(ShortloopError::code_space_exhausted(format!(
            "No free code found in {} attempts; consider a longer code length",
            self.max_code_attempts
        )))
    }

    /// Single write attempt with a deadline. Never retried: once the request
    /// leaves for the gateway its outcome is unknown, and re-sending could
    /// allocate the code twice.
    async fn store_link(&self, link: ShortLink, now: DateTime<Utc>) -> Result<()> {
        let code = link.code.clone();
        let result = timeout(
            Duration::from_millis(self.store_timeout_ms),
            self.storage.put_if_absent(link, now),
        )
        .await;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(ShortloopError::StoreUnavailable(msg))) => {
                Err(ShortloopError::create_ambiguous(format!(
                    "Store unavailable while inserting '{}'; the write may or may not have landed: {}",
                    code, msg
                )))
            }
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Err(ShortloopError::create_ambiguous(format!(
                "Insert of '{}' timed out after {}ms; the write may or may not have landed",
                code, self.store_timeout_ms
            ))),
        }
    }

    /// Resolve a code to its live link.
    ///
    /// Cache-aside with the expiry re-checked locally: even a cache hit is
    /// never served past `expires_at`. Distinguishes a link that never
    /// existed (`NotFound`) from one that used to (`LinkExpired`).
    pub async fn resolve_link(&self, code: &str) -> Result<ShortLink> {
        let now = self.clock.now();

        match self.cache_get(code).await {
            CacheResult::Found(link) if !link.is_expired(now) => {
                debug!(code = %code, "Cache hit");
                return Ok(link);
            }
            CacheResult::Found(_) => {
                // The entry outlived the link (clock skew, long default TTL).
                debug!(code = %code, "Evicting expired cache entry");
                self.cache_remove(code).await;
            }
            CacheResult::Miss => {}
        }

        let stored = with_retry_timeout("storage_get", self.retry, self.store_timeout_ms, || {
            self.storage.get(code)
        })
        .await?;

        match stored {
            None => Err(ShortloopError::not_found(format!(
                "No link for code '{}'",
                code
            ))),
            Some(link) if link.is_expired(now) => Err(ShortloopError::link_expired(format!(
                "Link '{}' expired at {}",
                code,
                link.expires_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default()
            ))),
            Some(link) => {
                self.cache_populate(&link, now).await;
                Ok(link)
            }
        }
    }

    /// Remove a link. Idempotent: deleting an absent or expired code
    /// succeeds. The gateway is updated first, then the cache entry is
    /// dropped so no reader can be served the deleted link from cache.
    pub async fn delete_link(&self, code: &str) -> Result<()> {
        let result = timeout(
            Duration::from_millis(self.store_timeout_ms),
            self.storage.remove(code),
        )
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_elapsed) => {
                return Err(ShortloopError::store_unavailable(format!(
                    "Delete of '{}' timed out after {}ms",
                    code, self.store_timeout_ms
                )));
            }
        }

        self.cache_remove(code).await;
        info!(code = %code, "Short link deleted");
        Ok(())
    }

    pub async fn backend_name(&self) -> String {
        self.storage.backend_name().await
    }

    /// Cache lookup with a deadline; a slow cache degrades to a miss.
    async fn cache_get(&self, code: &str) -> CacheResult {
        match timeout(
            Duration::from_millis(self.cache_timeout_ms),
            self.cache.get(code),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(code = %code, "Cache get timed out, treating as miss");
                CacheResult::Miss
            }
        }
    }

    /// Best-effort cache write; TTL is bounded by the link's remaining
    /// lifetime, and an already-expired link is never written at all.
    async fn cache_populate(&self, link: &ShortLink, now: DateTime<Utc>) {
        if let Some(ttl) = link.cache_ttl(self.default_ttl, now) {
            let write = self.cache.insert(&link.code, link.clone(), ttl);
            if timeout(Duration::from_millis(self.cache_timeout_ms), write)
                .await
                .is_err()
            {
                warn!(code = %link.code, "Cache insert timed out, skipping populate");
            }
        }
    }

    async fn cache_remove(&self, code: &str) {
        if timeout(
            Duration::from_millis(self.cache_timeout_ms),
            self.cache.remove(code),
        )
        .await
        .is_err()
        {
            warn!(code = %code, "Cache remove timed out");
        }
    }
}
