//! Durable checkpoint storage.
//!
//! This module contains:
//! - `PositionBackend` trait: upsert/read of one checkpoint row per
//!   `(server_id, client_id)`
//! - `StorageError` and the module `Result` alias
//! - Implementations: SQL (MySQL, PostgreSQL, SQLite), Mock

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::{StorageConfig, StorageType};
use crate::position::Position;

pub mod mock;
pub mod schema;
#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
pub mod sql;

pub use mock::MockPositionBackend;
#[cfg(feature = "mysql")]
pub use sql::mysql::MysqlPositionBackend;
#[cfg(feature = "postgres")]
pub use sql::postgres::PostgresPositionBackend;
#[cfg(feature = "sqlite")]
pub use sql::sqlite::SqlitePositionBackend;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while reading or writing checkpoints.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid stored offset {offset} for server_id={server_id}, client_id={client_id}")]
    InvalidOffset {
        server_id: u32,
        client_id: String,
        offset: i64,
    },

    #[error("Offset {0} does not fit the positions table")]
    OffsetOutOfRange(u64),

    #[error("Injected failure: {0}")]
    Injected(String),

    #[error("Position store halted after a write failure")]
    Halted,

    #[error("Flush worker did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("Flush worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Storage backend not available: {0}")]
    Unsupported(String),
}

/// Identity of one checkpoint row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointKey {
    /// `server_id` of the MySQL instance being tailed.
    pub server_id: u32,
    /// Logical name of the consumer.
    pub client_id: String,
}

impl CheckpointKey {
    pub fn new(server_id: u32, client_id: impl Into<String>) -> Self {
        Self {
            server_id,
            client_id: client_id.into(),
        }
    }
}

/// Durable storage for checkpoints.
///
/// Each call works on a single scoped connection that is released when the
/// call returns, whether it succeeded or not.
///
/// # Implementations
///
/// - `MysqlPositionBackend`: MySQL storage
/// - `PostgresPositionBackend`: PostgreSQL storage
/// - `SqlitePositionBackend`: SQLite storage
/// - `MockPositionBackend`: In-memory mock for testing
#[async_trait]
pub trait PositionBackend: Send + Sync {
    /// Create the `positions` table if it does not exist.
    async fn init(&self) -> Result<()>;

    /// Upsert the checkpoint for `key`.
    ///
    /// Creates the row if it doesn't exist, updates it if it does.
    async fn write(&self, key: &CheckpointKey, position: &Position) -> Result<()>;

    /// Read the checkpoint for `key`.
    ///
    /// Returns `None` if nothing has been stored for this key yet.
    async fn read(&self, key: &CheckpointKey) -> Result<Option<Position>>;
}

/// Connect to the configured backing store and make sure the schema exists.
pub async fn init_backend(config: &StorageConfig) -> Result<Arc<dyn PositionBackend>> {
    info!(
        storage_type = ?config.storage_type,
        schema = %config.schema,
        "Connecting checkpoint storage"
    );

    let backend: Arc<dyn PositionBackend> = match config.storage_type {
        #[cfg(feature = "mysql")]
        StorageType::Mysql => {
            let pool = sqlx::mysql::MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.uri)
                .await?;
            Arc::new(MysqlPositionBackend::new(pool, &config.schema))
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.uri)
                .await?;
            Arc::new(PostgresPositionBackend::new(pool, &config.schema))
        }
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            let options = config
                .uri
                .parse::<sqlx::sqlite::SqliteConnectOptions>()?
                .create_if_missing(true);
            let pool = sqlx::sqlite::SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_with(options)
                .await?;
            Arc::new(SqlitePositionBackend::new(pool, &config.schema))
        }
        #[allow(unreachable_patterns)]
        other => {
            error!(storage_type = ?other, "Storage backend requested but its feature is not enabled");
            return Err(StorageError::Unsupported(format!("{:?}", other)));
        }
    };

    backend.init().await?;
    Ok(backend)
}
