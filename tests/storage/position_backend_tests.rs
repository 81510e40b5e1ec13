//! PositionBackend interface tests.
//!
//! These tests verify the contract of the PositionBackend trait.
//! Each storage implementation should run these tests.

use binlog_checkpoint::{CheckpointKey, Position, PositionBackend};

// =============================================================================
// PositionBackend::read tests
// =============================================================================

pub async fn test_read_nonexistent<B: PositionBackend>(backend: &B) {
    let result = backend
        .read(&CheckpointKey::new(4_000_000, "test_missing"))
        .await
        .expect("read should succeed");
    assert!(result.is_none(), "nonexistent checkpoint should be None");
}

// =============================================================================
// PositionBackend::write tests
// =============================================================================

pub async fn test_write_and_read<B: PositionBackend>(backend: &B) {
    let key = CheckpointKey::new(1, "test_maxwell");
    let position = Position::new("bin.000002", 4096);

    backend
        .write(&key, &position)
        .await
        .expect("write should succeed");

    let result = backend
        .read(&key)
        .await
        .expect("read should succeed")
        .expect("checkpoint should exist");

    assert_eq!(result, position, "should return written position");
}

pub async fn test_write_updates_in_place<B: PositionBackend>(backend: &B) {
    let key = CheckpointKey::new(2, "test_update");

    backend
        .write(&key, &Position::new("bin.000001", 120))
        .await
        .unwrap();
    backend
        .write(&key, &Position::new("bin.000003", 4))
        .await
        .unwrap();

    let result = backend.read(&key).await.unwrap().unwrap();
    assert_eq!(
        result,
        Position::new("bin.000003", 4),
        "should return updated position"
    );
}

pub async fn test_write_zero_offset<B: PositionBackend>(backend: &B) {
    let key = CheckpointKey::new(3, "test_zero");

    backend
        .write(&key, &Position::new("bin.000001", 0))
        .await
        .unwrap();

    let result = backend.read(&key).await.unwrap().unwrap();
    assert_eq!(result.offset(), 0, "should store offset 0");
}

pub async fn test_write_large_offset<B: PositionBackend>(backend: &B) {
    let key = CheckpointKey::new(4, "test_large");
    let position = Position::new("bin.000001", 5_000_000_000);

    backend.write(&key, &position).await.unwrap();

    let result = backend.read(&key).await.unwrap().unwrap();
    assert_eq!(result, position, "offsets past 32 bits should round-trip");
}

// =============================================================================
// Isolation tests
// =============================================================================

pub async fn test_client_isolation<B: PositionBackend>(backend: &B) {
    let a = CheckpointKey::new(10, "test_client_a");
    let b = CheckpointKey::new(10, "test_client_b");

    backend
        .write(&a, &Position::new("bin.000005", 10))
        .await
        .unwrap();
    backend
        .write(&b, &Position::new("bin.000009", 20))
        .await
        .unwrap();

    assert_eq!(
        backend.read(&a).await.unwrap(),
        Some(Position::new("bin.000005", 10)),
        "client_a should keep its own checkpoint"
    );
    assert_eq!(
        backend.read(&b).await.unwrap(),
        Some(Position::new("bin.000009", 20)),
        "client_b should keep its own checkpoint"
    );
}

pub async fn test_server_isolation<B: PositionBackend>(backend: &B) {
    let x = CheckpointKey::new(21, "test_server_iso");
    let y = CheckpointKey::new(22, "test_server_iso");

    backend
        .write(&x, &Position::new("mysql-bin.000001", 5))
        .await
        .unwrap();
    backend
        .write(&y, &Position::new("mysql-bin.000002", 15))
        .await
        .unwrap();

    assert_eq!(
        backend.read(&x).await.unwrap().unwrap().offset(),
        5,
        "server 21 should be 5"
    );
    assert_eq!(
        backend.read(&y).await.unwrap().unwrap().offset(),
        15,
        "server 22 should be 15"
    );
}

// =============================================================================
// Schema tests
// =============================================================================

pub async fn test_init_is_idempotent<B: PositionBackend>(backend: &B) {
    let key = CheckpointKey::new(30, "test_init");
    backend
        .write(&key, &Position::new("bin.000001", 1))
        .await
        .unwrap();

    backend.init().await.expect("second init should succeed");

    assert!(
        backend.read(&key).await.unwrap().is_some(),
        "init must not drop existing checkpoints"
    );
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all PositionBackend interface tests against a backend implementation.
#[macro_export]
macro_rules! run_position_backend_tests {
    ($backend:expr) => {
        use $crate::storage::position_backend_tests::*;

        // read tests
        test_read_nonexistent($backend).await;
        println!("  test_read_nonexistent: PASSED");

        // write tests
        test_write_and_read($backend).await;
        println!("  test_write_and_read: PASSED");

        test_write_updates_in_place($backend).await;
        println!("  test_write_updates_in_place: PASSED");

        test_write_zero_offset($backend).await;
        println!("  test_write_zero_offset: PASSED");

        test_write_large_offset($backend).await;
        println!("  test_write_large_offset: PASSED");

        // isolation tests
        test_client_isolation($backend).await;
        println!("  test_client_isolation: PASSED");

        test_server_isolation($backend).await;
        println!("  test_server_isolation: PASSED");

        // schema tests
        test_init_is_idempotent($backend).await;
        println!("  test_init_is_idempotent: PASSED");
    };
}
