use std::sync::Arc;

use crate::config::get_config;
use crate::errors::{Result, ShortloopError};

pub mod macros;
pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache};

pub struct CacheFactory;

impl CacheFactory {
    pub async fn create() -> Result<Arc<dyn ObjectCache>> {
        register::debug_cache_registry();

        let backend = get_config().cache.backend.as_str();

        let constructor = register::get_object_cache_plugin(backend).ok_or_else(|| {
            ShortloopError::config(format!(
                "Unknown cache backend '{}'. Expected 'moka', 'memory', 'redis' or 'null'",
                backend
            ))
        })?;

        let cache = constructor().await?;
        Ok(Arc::from(cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_builds_registered_backend() {
        // Default backend is moka; its plugin registers via ctor.
        let cache = CacheFactory::create().await.unwrap();
        assert!(matches!(cache.get("missing").await, CacheResult::Miss));
    }

    #[test]
    fn test_registry_knows_all_builtin_backends() {
        for backend in ["moka", "memory", "redis", "null"] {
            assert!(
                register::get_object_cache_plugin(backend).is_some(),
                "backend '{}' not registered",
                backend
            );
        }
    }
}
