use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::models::{Astronaut, User};

pub mod memory;
pub mod migrator;
pub mod repositories;

pub use repositories::astronaut::AstronautRepository;
pub use repositories::user::UserRepository;

/// Failures reported by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Store operation timed out")]
    Timeout,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Conflict(detail),
            _ => Self::Database(err.to_string()),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence contract for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user and returns the generated id.
    async fn create(&self, user: &User) -> StoreResult<i32>;

    /// Users ordered by surname ascending.
    async fn list(&self, limit: u64, offset: u64) -> StoreResult<Vec<User>>;

    async fn get(&self, id: i32) -> StoreResult<Option<User>>;

    /// Writes profile fields and role. Password and API key are left alone.
    async fn update(&self, user: &User) -> StoreResult<()>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> StoreResult<bool>;

    async fn search_by_api_key(&self, key: &str) -> StoreResult<Option<User>>;

    /// Writes `user.password` (already hashed) and `updated_at`.
    async fn update_password(&self, user: &User) -> StoreResult<()>;

    /// Writes `user.api_key` and `updated_at`.
    async fn update_api_key(&self, user: &User) -> StoreResult<()>;
}

/// Persistence contract for astronaut records.
#[async_trait]
pub trait AstronautStore: Send + Sync {
    async fn create(&self, astronaut: &Astronaut) -> StoreResult<i32>;

    /// Astronauts ordered by name ascending.
    async fn list(&self, limit: u64, offset: u64) -> StoreResult<Vec<Astronaut>>;

    async fn get(&self, id: i32) -> StoreResult<Option<Astronaut>>;

    async fn update(&self, astronaut: &Astronaut) -> StoreResult<()>;

    async fn delete(&self, id: i32) -> StoreResult<bool>;
}

/// Pooled SQLite connection with migrations applied.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn users(&self) -> Arc<dyn UserStore> {
        Arc::new(UserRepository::new(self.conn.clone()))
    }

    #[must_use]
    pub fn astronauts(&self) -> Arc<dyn AstronautStore> {
        Arc::new(AstronautRepository::new(self.conn.clone()))
    }
}
