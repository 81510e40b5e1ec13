//! Mock checkpoint backend for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CheckpointKey, PositionBackend, Result, StorageError};
use crate::position::Position;

/// Mock backend that keeps checkpoints in memory and records every write.
#[derive(Default)]
pub struct MockPositionBackend {
    rows: RwLock<HashMap<CheckpointKey, Position>>,
    writes: RwLock<Vec<Position>>,
    fail_on_write: RwLock<bool>,
    fail_on_read: RwLock<bool>,
}

impl MockPositionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    /// Store a row directly, without counting it as a write.
    pub async fn seed(&self, key: CheckpointKey, position: Position) {
        self.rows.write().await.insert(key, position);
    }

    pub async fn write_count(&self) -> usize {
        self.writes.read().await.len()
    }

    /// Every successfully written position, in write order.
    pub async fn writes(&self) -> Vec<Position> {
        self.writes.read().await.clone()
    }

    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl PositionBackend for MockPositionBackend {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn write(&self, key: &CheckpointKey, position: &Position) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StorageError::Injected("mock write failure".to_string()));
        }
        self.rows
            .write()
            .await
            .insert(key.clone(), position.clone());
        self.writes.write().await.push(position.clone());
        Ok(())
    }

    async fn read(&self, key: &CheckpointKey) -> Result<Option<Position>> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Injected("mock read failure".to_string()));
        }
        Ok(self.rows.read().await.get(key).cloned())
    }
}
