//! binlog-checkpoint: inspect a stored checkpoint
//!
//! Connects to the configured checkpoint store and prints the position a
//! client with the configured `(server_id, client_id)` would resume from.
//! The store is opened read-only, so running this never moves a checkpoint.
//!
//! ## Usage
//! ```text
//! binlog-checkpoint [CONFIG_FILE]
//! ```
//!
//! ## Configuration
//! - BINLOG_CHECKPOINT_CONFIG: Path to a YAML config file (optional)
//! - BINLOG_CHECKPOINT__*: Overrides for individual settings
//!   (e.g. BINLOG_CHECKPOINT__STORAGE__URI)
//! - BINLOG_CHECKPOINT_LOG: Log filter (default: info)

use tracing::info;

use binlog_checkpoint::config::CheckpointConfig;
use binlog_checkpoint::storage::init_backend;
use binlog_checkpoint::utils::bootstrap::init_tracing;
use binlog_checkpoint::PositionStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let path = std::env::args().nth(1);
    let config = CheckpointConfig::load(path.as_deref())?;
    let backend = init_backend(&config.storage).await?;
    let store = PositionStore::read_only(backend, config.key());

    info!(
        server_id = config.server_id,
        client_id = %config.client_id,
        "Reading checkpoint"
    );

    match store.get().await? {
        Some(position) => println!("{}", position),
        None => println!(
            "no checkpoint for server_id={} client_id={}",
            config.server_id, config.client_id
        ),
    }

    Ok(())
}
