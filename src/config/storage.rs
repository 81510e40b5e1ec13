//! Storage configuration types.

use serde::Deserialize;

/// Storage type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Mysql,
    Postgres,
    #[default]
    Sqlite,
}

/// Checkpoint storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Connection URI.
    pub uri: String,
    /// Schema (MySQL database, PostgreSQL search path) holding the
    /// `positions` table.
    pub schema: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Sqlite,
            uri: "sqlite://./data/positions.db".to_string(),
            schema: "maxwell".to_string(),
            max_connections: 5,
        }
    }
}
