//! Durable storage backend over sea-orm (SQLite, Postgres, MySQL).
//!
//! Uniqueness is enforced by the primary key on `short_code`: the insert
//! with `ON CONFLICT DO NOTHING` is the atomic `put_if_absent` primitive the
//! whole system leans on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, ExprTrait, QueryFilter, Schema,
};
use tracing::{debug, info};

use super::{ShortLink, Storage};
use crate::config::get_config;
use crate::errors::{Result, ShortloopError};

pub mod short_link {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "short_link")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub short_code: String,
        pub target_url: String,
        pub created_at: DateTimeUtc,
        pub expires_at: Option<DateTimeUtc>,
        pub alias_requested: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStorage {
    pub async fn new_async() -> Result<Self> {
        Self::new_with_url(&get_config().storage.database_url).await
    }

    pub async fn new_with_url(database_url: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(ShortloopError::config("DATABASE_URL is not set"));
        }

        let backend_name = database_url
            .split("://")
            .next()
            .unwrap_or("sqlite")
            .to_string();

        let db = if backend_name.starts_with("sqlite") {
            Self::connect_sqlite(database_url).await?
        } else {
            Self::connect_generic(database_url, &backend_name).await?
        };

        let storage = SeaOrmStorage { db, backend_name };
        storage.init_schema().await?;

        info!("{} storage initialized", storage.backend_name.to_uppercase());
        Ok(storage)
    }

    /// Connect to SQLite with auto-create and WAL mode.
    async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::SqlitePool;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| ShortloopError::config(format!("Failed to parse SQLite URL: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePool::connect_with(opt).await.map_err(|e| {
            ShortloopError::database_connection(format!("Failed to connect to SQLite: {}", e))
        })?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// Connect to MySQL/PostgreSQL.
    async fn connect_generic(database_url: &str, backend_name: &str) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(100)
            .min_connections(5)
            .connect_timeout(std::time::Duration::from_secs(8))
            .acquire_timeout(std::time::Duration::from_secs(8))
            .sqlx_logging(false);

        Database::connect(opt).await.map_err(|e| {
            ShortloopError::database_connection(format!(
                "Failed to connect to {} database: {}",
                backend_name.to_uppercase(),
                e
            ))
        })
    }

    async fn init_schema(&self) -> Result<()> {
        let builder = self.db.get_database_backend();
        let schema = Schema::new(builder);
        let mut stmt = schema.create_table_from_entity(short_link::Entity);
        stmt.if_not_exists();

        self.db
            .execute(&stmt)
            .await
            .map_err(ShortloopError::from)?;

        debug!("short_link table ready");
        Ok(())
    }

    fn model_to_shortlink(model: short_link::Model) -> ShortLink {
        ShortLink {
            code: model.short_code,
            target: model.target_url,
            created_at: model.created_at,
            expires_at: model.expires_at,
            alias_requested: model.alias_requested,
        }
    }

    fn shortlink_to_active_model(link: &ShortLink) -> short_link::ActiveModel {
        use sea_orm::ActiveValue::Set;

        short_link::ActiveModel {
            short_code: Set(link.code.clone()),
            target_url: Set(link.target.clone()),
            created_at: Set(link.created_at),
            expires_at: Set(link.expires_at),
            alias_requested: Set(link.alias_requested),
        }
    }
}

#[async_trait]
impl Storage for SeaOrmStorage {
    async fn get(&self, code: &str) -> Result<Option<ShortLink>> {
        short_link::Entity::find_by_id(code)
            .one(&self.db)
            .await
            .map(|model| model.map(Self::model_to_shortlink))
            .map_err(ShortloopError::from)
    }

    async fn put_if_absent(&self, link: ShortLink, now: DateTime<Utc>) -> Result<()> {
        use sea_orm::sea_query::OnConflict;

        // Clear a dead record first so its code is reusable. Racing deletes
        // are harmless; the insert below stays the single ordering point.
        short_link::Entity::delete_many()
            .filter(
                short_link::Column::ShortCode
                    .eq(link.code.as_str())
                    .and(short_link::Column::ExpiresAt.is_not_null())
                    .and(short_link::Column::ExpiresAt.lte(now)),
            )
            .exec(&self.db)
            .await
            .map_err(ShortloopError::from)?;

        let active_model = Self::shortlink_to_active_model(&link);
        let result = short_link::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(short_link::Column::ShortCode)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotInserted) => Err(ShortloopError::conflict(format!(
                "Code '{}' already exists",
                link.code
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, code: &str) -> Result<()> {
        short_link::Entity::delete_by_id(code)
            .exec(&self.db)
            .await
            .map_err(ShortloopError::from)?;
        Ok(())
    }

    async fn backend_name(&self) -> String {
        self.backend_name.clone()
    }
}
