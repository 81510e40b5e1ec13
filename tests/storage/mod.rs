//! Shared storage integration tests.
//!
//! Tests the PositionBackend interface against all implementations.
//! Each implementation module imports these test functions and runs them.

pub mod position_backend_tests;
