//! SQLite storage integration tests.
//!
//! Run with: cargo test --test storage_sqlite --features sqlite
//!
//! Uses a throwaway database file, no external dependencies required.

mod storage;

use binlog_checkpoint::config::{StorageConfig, StorageType};
use binlog_checkpoint::storage::{init_backend, SqlitePositionBackend};
use binlog_checkpoint::{CheckpointKey, Position, PositionBackend, StorageError};
use tempfile::TempDir;

async fn connect_and_init(dir: &TempDir) -> SqlitePositionBackend {
    let uri = format!("sqlite://{}?mode=rwc", dir.path().join("positions.db").display());
    let pool = sqlx::SqlitePool::connect(&uri)
        .await
        .expect("Failed to connect to SQLite");

    let backend = SqlitePositionBackend::new(pool, "maxwell");
    backend.init().await.expect("Failed to create positions table");
    backend
}

#[tokio::test]
async fn test_sqlite_position_backend() {
    println!("=== SQLite PositionBackend Tests ===");

    let dir = TempDir::new().unwrap();
    let backend = connect_and_init(&dir).await;

    run_position_backend_tests!(&backend);

    println!("=== All SQLite PositionBackend tests PASSED ===");
}

#[tokio::test]
async fn test_sqlite_upsert_keeps_single_row() {
    let dir = TempDir::new().unwrap();
    let backend = connect_and_init(&dir).await;
    let key = CheckpointKey::new(40, "maxwell");

    for offset in [4u64, 120, 4096] {
        backend
            .write(&key, &Position::new("bin.000001", offset))
            .await
            .unwrap();
    }

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM positions WHERE server_id = 40 AND client_id = 'maxwell'")
            .fetch_one(backend.pool())
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_sqlite_negative_stored_offset_is_rejected() {
    let dir = TempDir::new().unwrap();
    let backend = connect_and_init(&dir).await;

    sqlx::query(
        "INSERT INTO positions (server_id, binlog_file, binlog_position, client_id) \
         VALUES (50, 'bin.000001', -1, 'maxwell')",
    )
    .execute(backend.pool())
    .await
    .unwrap();

    let result = backend.read(&CheckpointKey::new(50, "maxwell")).await;
    assert!(matches!(
        result,
        Err(StorageError::InvalidOffset { server_id: 50, offset: -1, .. })
    ));
}

#[tokio::test]
async fn test_sqlite_offset_out_of_range() {
    let dir = TempDir::new().unwrap();
    let backend = connect_and_init(&dir).await;

    let result = backend
        .write(
            &CheckpointKey::new(60, "maxwell"),
            &Position::new("bin.000001", u64::MAX),
        )
        .await;
    assert!(matches!(result, Err(StorageError::OffsetOutOfRange(u64::MAX))));
}

#[tokio::test]
async fn test_sqlite_read_fails_without_table() {
    let dir = TempDir::new().unwrap();
    let uri = format!("sqlite://{}?mode=rwc", dir.path().join("empty.db").display());
    let pool = sqlx::SqlitePool::connect(&uri).await.unwrap();
    let backend = SqlitePositionBackend::new(pool, "maxwell");

    let result = backend.read(&CheckpointKey::new(1, "maxwell")).await;
    assert!(matches!(result, Err(StorageError::Database(_))));
}

#[tokio::test]
async fn test_init_backend_from_config() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig {
        storage_type: StorageType::Sqlite,
        uri: format!("sqlite://{}", dir.path().join("configured.db").display()),
        schema: "maxwell".to_string(),
        max_connections: 2,
    };

    let backend = init_backend(&config).await.unwrap();
    let key = CheckpointKey::new(1, "maxwell");
    backend
        .write(&key, &Position::new("bin.000002", 4096))
        .await
        .unwrap();

    assert_eq!(
        backend.read(&key).await.unwrap(),
        Some(Position::new("bin.000002", 4096))
    );
}
