//! In-memory position tracking.
//!
//! Holds the latest position reported by the log reader (`current`) and the
//! latest position confirmed durable (`stored`). Each lives in its own
//! `watch` channel, so reads never wait on the flush worker and the flush
//! worker never waits on the reader.

use tokio::sync::watch;

use crate::position::Position;

/// Tracks the current and last-stored binlog positions.
#[derive(Debug)]
pub struct PositionTracker {
    current: watch::Sender<Option<Position>>,
    stored: watch::Sender<Option<Position>>,
}

impl PositionTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        let (stored, _) = watch::channel(None);
        Self { current, stored }
    }

    /// Advance `current` to `position` if it is newer.
    ///
    /// Returns whether the tracked position moved. Positions that are not
    /// strictly newer are dropped, so duplicate or reordered delivery can
    /// never move the checkpoint backwards.
    pub fn update(&self, position: Position) -> bool {
        self.current.send_if_modified(|current| {
            if position.newer_than(current.as_ref()) {
                *current = Some(position);
                true
            } else {
                false
            }
        })
    }

    /// Snapshot of the current in-memory position.
    pub fn current(&self) -> Option<Position> {
        self.current.borrow().clone()
    }

    /// Snapshot of the last durably stored position.
    pub fn stored(&self) -> Option<Position> {
        self.stored.borrow().clone()
    }

    /// The position a flush should write, if `current` is ahead of `stored`.
    pub fn pending(&self) -> Option<Position> {
        let current = self.current()?;
        let stored = self.stored.borrow();
        current.newer_than(stored.as_ref()).then_some(current)
    }

    /// Record that `position` has been written to the backing store.
    pub(crate) fn mark_stored(&self, position: Position) {
        self.stored.send_replace(Some(position));
    }

    /// Subscribe to changes of the current position.
    pub fn watch_current(&self) -> watch::Receiver<Option<Position>> {
        self.current.subscribe()
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}
