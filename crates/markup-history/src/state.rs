//! History state queries and change notifications.
//!
//! Hosts render undo/redo buttons from a [`HistoryState`] snapshot and can subscribe to
//! [`HistoryChange`] events instead of polling.
//!
//! # Example
//!
//! ```rust
//! use markup_history::{HistoryChangeKind, HistoryManager, MarkupBuffer};
//! use std::sync::{Arc, Mutex};
//!
//! let mut manager = HistoryManager::new(MarkupBuffer::new(""));
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! manager.subscribe(move |change| sink.lock().unwrap().push(change.kind));
//!
//! manager.edit(0, 0, "hi").unwrap();
//! assert!(manager.undo());
//!
//! assert_eq!(
//!     *seen.lock().unwrap(),
//!     vec![HistoryChangeKind::Recorded, HistoryChangeKind::Undone]
//! );
//! assert!(manager.state().can_redo);
//! ```

use crate::log::HistoryLog;

/// Snapshot of the undo/redo state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    /// Can undo
    pub can_undo: bool,
    /// Can redo
    pub can_redo: bool,
    /// Number of undoable records
    pub undo_depth: usize,
    /// Number of redoable records
    pub redo_depth: usize,
    /// Incremented on every change of the history
    pub version: u64,
}

impl HistoryState {
    pub(crate) fn of(log: &HistoryLog, version: u64) -> Self {
        Self {
            can_undo: log.can_undo(),
            can_redo: log.can_redo(),
            undo_depth: log.undo_depth(),
            redo_depth: log.redo_depth(),
            version,
        }
    }
}

/// What happened to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryChangeKind {
    /// A change made by the user was recorded.
    Recorded,
    /// A record was undone.
    Undone,
    /// A record was redone.
    Redone,
    /// The history was cleared.
    Cleared,
    /// The history was restored from a store.
    Restored,
}

/// History change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryChange {
    /// Change kind
    pub kind: HistoryChangeKind,
    /// State after the change
    pub state: HistoryState,
}

/// History change callback.
pub type HistoryChangeCallback = Box<dyn FnMut(&HistoryChange) + Send>;

/// Subscribers plus the version counter.
#[derive(Default)]
pub(crate) struct Subscribers {
    callbacks: Vec<HistoryChangeCallback>,
    version: u64,
}

impl Subscribers {
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn subscribe(&mut self, callback: HistoryChangeCallback) {
        self.callbacks.push(callback);
    }

    /// Bump the version and notify every callback.
    pub(crate) fn notify(&mut self, kind: HistoryChangeKind, log: &HistoryLog) {
        self.version += 1;
        let change = HistoryChange {
            kind,
            state: HistoryState::of(log, self.version),
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("callbacks", &self.callbacks.len())
            .field("version", &self.version)
            .finish()
    }
}
