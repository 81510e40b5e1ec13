//! Application configuration.
//!
//! Loaded from YAML files and environment variables into a single
//! `CheckpointConfig`.

mod storage;

use std::time::Duration;

use serde::Deserialize;

pub use storage::{StorageConfig, StorageType};

use crate::flush::FlushMode;
use crate::storage::CheckpointKey;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "BINLOG_CHECKPOINT_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "BINLOG_CHECKPOINT";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "BINLOG_CHECKPOINT_LOG";

/// Checkpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Backing store for checkpoints.
    pub storage: StorageConfig,
    /// `server_id` of the MySQL instance being tailed.
    pub server_id: u32,
    /// Logical consumer name.
    pub client_id: String,
    /// Flush cadence in milliseconds.
    pub flush_interval_ms: u64,
    /// How long `stop_loop` waits for the flush worker.
    pub shutdown_timeout_ms: u64,
    /// Track positions without ever writing them (replay).
    pub read_only: bool,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            server_id: 1,
            client_id: "maxwell".to_string(),
            flush_interval_ms: 1000,
            shutdown_timeout_ms: 5000,
            read_only: false,
        }
    }
}

impl CheckpointConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Checkpoint row this client owns.
    pub fn key(&self) -> CheckpointKey {
        CheckpointKey::new(self.server_id, self.client_id.clone())
    }

    pub fn mode(&self) -> FlushMode {
        if self.read_only {
            FlushMode::ObserveOnly
        } else {
            FlushMode::Durable
        }
    }
}
