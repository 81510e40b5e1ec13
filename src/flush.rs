//! Checkpointing position store.
//!
//! `PositionStore` pairs a `PositionTracker` with a background flush task.
//! The log reader calls [`PositionStore::set`] on every event; the flush task
//! wakes on a fixed cadence and upserts the tracked position whenever it is
//! strictly newer than the last one written.
//!
//! A failed write is fatal: the fault is recorded, the task stops, and no
//! further writes are attempted. Continuing to tail the log without being
//! able to checkpoint would grow the replay window without bound, so the
//! owning process is expected to watch [`PositionStore::fault_watch`] and
//! shut down.
//!
//! In [`FlushMode::ObserveOnly`] the store tracks positions in memory but
//! never starts the task and never writes. This is used when replaying an
//! existing log range without moving the checkpoint.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::CheckpointConfig;
use crate::position::Position;
use crate::storage::{CheckpointKey, PositionBackend, Result, StorageError};
use crate::tracker::PositionTracker;

/// Default flush cadence.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);
/// Default bound on how long `stop_loop` waits for the flush task.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether the store persists positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Flush periodically and on shutdown.
    Durable,
    /// Track in memory only; the checkpoint row is never touched.
    ObserveOnly,
}

/// Lifecycle of the flush task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
    Stopping,
    /// A write failed. Terminal.
    Halted,
}

enum Lifecycle {
    Idle,
    Started(JoinHandle<()>),
    Finished,
}

/// State shared between the store handle and its flush task.
struct Shared {
    key: CheckpointKey,
    backend: Arc<dyn PositionBackend>,
    tracker: PositionTracker,
    mode: FlushMode,
    state: watch::Sender<LoopState>,
    fault: watch::Sender<Option<Arc<StorageError>>>,
    cancel: watch::Sender<bool>,
    // Serializes flushes so `stored` and the checkpoint row only move forward.
    flush_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    fn has_fault(&self) -> bool {
        self.fault.borrow().is_some()
    }

    fn transition(&self, to: LoopState) {
        self.state.send_if_modified(|state| {
            if *state == LoopState::Halted || *state == to {
                false
            } else {
                *state = to;
                true
            }
        });
    }

    fn request_stop(&self) {
        self.cancel.send_replace(true);
        self.state.send_if_modified(|state| {
            if *state == LoopState::Running {
                *state = LoopState::Stopping;
                true
            } else {
                false
            }
        });
    }

    /// Record the first write fault and stop the flush task for good.
    fn halt(&self, err: StorageError) {
        self.fault.send_if_modified(|fault| {
            if fault.is_none() {
                *fault = Some(Arc::new(err));
                true
            } else {
                false
            }
        });
        self.state.send_replace(LoopState::Halted);
        self.request_stop();
    }

    async fn flush(&self) -> Result<bool> {
        let _guard = self.flush_lock.lock().await;
        if self.has_fault() {
            return Err(StorageError::Halted);
        }
        if self.mode == FlushMode::ObserveOnly {
            return Ok(false);
        }
        let Some(position) = self.tracker.pending() else {
            return Ok(false);
        };
        self.persist(position).await?;
        Ok(true)
    }

    /// Write whatever is current, newer than `stored` or not.
    async fn final_flush(&self) {
        let _guard = self.flush_lock.lock().await;
        if self.has_fault() || self.mode == FlushMode::ObserveOnly {
            return;
        }
        let Some(position) = self.tracker.current() else {
            return;
        };
        info!(
            server_id = self.key.server_id,
            client_id = %self.key.client_id,
            position = %position,
            "Storing final position"
        );
        // A failure is recorded as the store's fault.
        let _ = self.persist(position).await;
    }

    async fn persist(&self, position: Position) -> Result<()> {
        match self.backend.write(&self.key, &position).await {
            Ok(()) => {
                self.tracker.mark_stored(position);
                Ok(())
            }
            Err(e) => {
                error!(
                    server_id = self.key.server_id,
                    client_id = %self.key.client_id,
                    position = %position,
                    error = %e,
                    "Failed to store binlog position, halting position flush"
                );
                self.halt(e);
                Err(StorageError::Halted)
            }
        }
    }
}

async fn run(shared: Arc<Shared>, interval: Duration) {
    let mut cancel = shared.cancel.subscribe();
    info!(
        server_id = shared.key.server_id,
        client_id = %shared.key.client_id,
        interval = ?interval,
        "Position flush task started"
    );

    loop {
        if *cancel.borrow() {
            break;
        }
        if shared.flush().await.is_err() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.changed() => {}
        }
    }

    shared.final_flush().await;
    shared.transition(LoopState::Stopped);
    info!(
        server_id = shared.key.server_id,
        client_id = %shared.key.client_id,
        "Position flush task stopped"
    );
}

/// Tracks the latest binlog position and checkpoints it to a backing store.
pub struct PositionStore {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
    flush_interval: Duration,
    shutdown_timeout: Duration,
}

impl PositionStore {
    /// Create a durable store for `key`.
    pub fn new(backend: Arc<dyn PositionBackend>, key: CheckpointKey) -> Self {
        Self::with_mode(backend, key, FlushMode::Durable)
    }

    /// Create a store that tracks positions but never writes them.
    pub fn read_only(backend: Arc<dyn PositionBackend>, key: CheckpointKey) -> Self {
        Self::with_mode(backend, key, FlushMode::ObserveOnly)
    }

    pub fn with_mode(backend: Arc<dyn PositionBackend>, key: CheckpointKey, mode: FlushMode) -> Self {
        let (state, _) = watch::channel(LoopState::Stopped);
        let (fault, _) = watch::channel(None);
        let (cancel, _) = watch::channel(false);

        Self {
            shared: Arc::new(Shared {
                key,
                backend,
                tracker: PositionTracker::new(),
                mode,
                state,
                fault,
                cancel,
                flush_lock: tokio::sync::Mutex::new(()),
            }),
            lifecycle: Mutex::new(Lifecycle::Idle),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Build a store from configuration.
    pub fn from_config(backend: Arc<dyn PositionBackend>, config: &CheckpointConfig) -> Self {
        Self::with_mode(backend, config.key(), config.mode())
            .with_flush_interval(config.flush_interval())
            .with_shutdown_timeout(config.shutdown_timeout())
    }

    /// Set the flush cadence.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set how long `stop_loop` waits for the flush task.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn key(&self) -> &CheckpointKey {
        &self.shared.key
    }

    pub fn mode(&self) -> FlushMode {
        self.shared.mode
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.shared.tracker
    }

    /// Report a processed position. Never blocks; positions that are not
    /// newer than the current one are ignored.
    pub fn set(&self, position: Position) {
        self.shared.tracker.update(position);
    }

    /// The current in-memory position.
    pub fn current(&self) -> Option<Position> {
        self.shared.tracker.current()
    }

    /// The last position confirmed written.
    pub fn stored(&self) -> Option<Position> {
        self.shared.tracker.stored()
    }

    /// The current position, falling back to the checkpoint row when nothing
    /// has been set yet.
    ///
    /// Read failures are returned to the caller rather than treated as "no
    /// checkpoint".
    pub async fn get(&self) -> Result<Option<Position>> {
        if let Some(position) = self.shared.tracker.current() {
            return Ok(Some(position));
        }
        self.shared.backend.read(&self.shared.key).await
    }

    /// Run one flush cycle now. Returns whether a write happened.
    ///
    /// Fails with `Halted` once a write has failed. Never writes in
    /// observe-only mode.
    pub async fn flush(&self) -> Result<bool> {
        self.shared.flush().await
    }

    /// The fatal write fault, if one occurred.
    pub fn fault(&self) -> Option<Arc<StorageError>> {
        self.shared.fault.borrow().clone()
    }

    /// Subscribe to the fault slot; resolves once a write fails.
    pub fn fault_watch(&self) -> watch::Receiver<Option<Arc<StorageError>>> {
        self.shared.fault.subscribe()
    }

    pub fn state(&self) -> LoopState {
        *self.shared.state.borrow()
    }

    /// Spawn the flush task. Must be called within a tokio runtime.
    ///
    /// No-op in observe-only mode and when the task was already started.
    pub fn start(&self) {
        if self.shared.mode == FlushMode::ObserveOnly {
            debug!(
                client_id = %self.shared.key.client_id,
                "Read-only position store, not starting flush task"
            );
            return;
        }

        let mut lifecycle = self.lock_lifecycle();
        if !matches!(*lifecycle, Lifecycle::Idle) {
            warn!(client_id = %self.shared.key.client_id, "Position flush task already started");
            return;
        }
        if self.shared.has_fault() {
            warn!(client_id = %self.shared.key.client_id, "Position store halted, not starting flush task");
            return;
        }

        self.shared.transition(LoopState::Running);
        let handle = tokio::spawn(run(Arc::clone(&self.shared), self.flush_interval));
        *lifecycle = Lifecycle::Started(handle);
    }

    /// Ask the flush task to exit after its current cycle. Does not wait.
    pub fn request_stop(&self) {
        self.shared.request_stop();
    }

    /// Stop the flush task and wait for its final flush.
    ///
    /// Wakes the task if it is sleeping, then waits up to the shutdown
    /// timeout for it to write the current position and exit. When the task
    /// was never started the final flush runs inline. Later calls return
    /// immediately. No-op in observe-only mode.
    ///
    /// A failed final flush does not fail this call. It is recorded like any
    /// other write fault, so shutdown callers should check [`Self::fault`]
    /// afterwards to learn whether the last position reached the backend.
    pub async fn stop_loop(&self) -> Result<()> {
        if self.shared.mode == FlushMode::ObserveOnly {
            return Ok(());
        }

        let previous = std::mem::replace(&mut *self.lock_lifecycle(), Lifecycle::Finished);
        match previous {
            Lifecycle::Finished => Ok(()),
            Lifecycle::Idle => {
                self.shared.request_stop();
                self.shared.final_flush().await;
                self.shared.transition(LoopState::Stopped);
                Ok(())
            }
            Lifecycle::Started(mut handle) => {
                self.shared.request_stop();
                match tokio::time::timeout(self.shutdown_timeout, &mut handle).await {
                    Ok(joined) => {
                        joined?;
                        Ok(())
                    }
                    Err(_) => {
                        error!(
                            client_id = %self.shared.key.client_id,
                            timeout = ?self.shutdown_timeout,
                            "Position flush task did not stop in time"
                        );
                        Err(StorageError::ShutdownTimeout(self.shutdown_timeout))
                    }
                }
            }
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PositionStore {
    fn drop(&mut self) {
        // Let a still-running task make its final flush and exit.
        self.shared.request_stop();
    }
}
