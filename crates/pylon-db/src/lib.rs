//! # pylon-db
//!
//! PostgreSQL persistence layer for pylon.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for events, notifications, and topic-role
//!   mappings
//!
//! ## Example
//!
//! ```rust,ignore
//! use pylon_db::Database;
//! use pylon_core::TopicMappingRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/pylon").await?;
//!
//!     db.topic_mappings
//!         .upsert("maint.alerts", &["TECHNICIAN".to_string()], "Maintenance alerts")
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod events;
pub mod notifications;
pub mod pool;
pub mod topic_mappings;

// Test fixtures are always compiled so integration tests (in tests/) can
// use DEFAULT_TEST_DATABASE_URL.
pub mod test_fixtures;

// Re-export core types
pub use pylon_core::*;

// Re-export repository implementations
pub use events::PgEventRepository;
pub use notifications::PgNotificationRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use topic_mappings::PgTopicMappingRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Domain event repository (write-once).
    pub events: PgEventRepository,
    /// Per-recipient notification repository.
    pub notifications: PgNotificationRepository,
    /// Topic-role mapping reference data.
    pub topic_mappings: PgTopicMappingRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            events: PgEventRepository::new(pool.clone()),
            notifications: PgNotificationRepository::new(pool.clone()),
            topic_mappings: PgTopicMappingRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = pool::create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = pool::create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
