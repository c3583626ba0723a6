use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::get_config;
use crate::errors::{Result, ShortloopError};

pub mod memory;
pub mod models;
pub mod retry;
pub mod sea_orm;

pub use models::ShortLink;

/// Persistence gateway: the durable code -> link mapping and the single
/// source of truth for code uniqueness.
///
/// `get` returns expired records too; interpreting expiry is the resolver's
/// job. `put_if_absent` is the only ordering primitive in the system and must
/// be atomic with respect to concurrent callers racing on the same code.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, code: &str) -> Result<Option<ShortLink>>;

    /// Insert `link` only if no live (non-expired) record holds its code.
    /// An existing expired record does not block insertion; expired codes
    /// are reusable. A losing racer gets `ShortloopError::Conflict`.
    ///
    /// Liveness of an existing record is judged against `now`, the
    /// resolver's request time.
    async fn put_if_absent(&self, link: ShortLink, now: DateTime<Utc>) -> Result<()>;

    /// Idempotent removal; removing an absent code is a no-op.
    async fn remove(&self, code: &str) -> Result<()>;

    async fn backend_name(&self) -> String;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create() -> Result<Arc<dyn Storage>> {
        let backend = get_config().storage.backend.as_str();

        let boxed: Box<dyn Storage> = match backend {
            "memory" => Box::new(memory::MemoryStorage::new()),
            "sea-orm" | "sqlite" | "postgres" | "mysql" => {
                Box::new(sea_orm::SeaOrmStorage::new_async().await?)
            }
            other => {
                return Err(ShortloopError::config(format!(
                    "Unknown storage backend '{}'. Expected 'sea-orm' or 'memory'",
                    other
                )));
            }
        };

        Ok(Arc::from(boxed))
    }
}
