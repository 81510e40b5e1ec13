//! Binlog checkpointing for change-data-capture clients.
//!
//! Tracks the most recently processed replication-log position in memory,
//! flushes it to a `positions` table on a fixed cadence, and stops making
//! progress the moment a flush fails so a restart never resumes from a
//! position that was not actually stored.

pub mod config;
pub mod flush;
pub mod position;
pub mod storage;
pub mod tracker;
pub mod utils;

pub use flush::{FlushMode, LoopState, PositionStore};
pub use position::Position;
pub use storage::{CheckpointKey, PositionBackend, StorageError};
pub use tracker::PositionTracker;
