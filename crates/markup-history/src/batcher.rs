//! Raw change batching.
//!
//! Widgets report changes keystroke by keystroke. [`ChangeBatcher`] folds consecutive
//! changes of the same kind that arrive within a short time window into the record on top of
//! the log, so a burst of typing or backspacing becomes one record.

use crate::log::HistoryLog;
use crate::record::{EditKind, EditRecord};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time source used by the batching window.
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Clock backed by [`Instant::now`].
pub fn system_clock() -> Clock {
    Arc::new(Instant::now)
}

/// What [`ChangeBatcher::record`] did with a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The change started a new record.
    Appended,
    /// The change was folded into the record on top of the log.
    Folded,
    /// The change was empty and ignored.
    Ignored,
}

/// Folds raw changes into coarse records.
#[derive(Debug, Clone)]
pub struct ChangeBatcher {
    window: Duration,
    last: Option<(EditKind, Instant)>,
}

impl ChangeBatcher {
    /// Create a batcher with the given window.
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Current batching window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Change the batching window.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Forget the previous change; the next one always starts a new record.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Record a raw change observed at `now`.
    pub fn record(&mut self, log: &mut HistoryLog, change: EditRecord, now: Instant) -> BatchOutcome {
        if change.before.is_empty() && change.after.is_empty() {
            return BatchOutcome::Ignored;
        }

        let kind = change.kind();
        let folded = self.can_fold(log, kind, now) && Self::fold(log, &change, kind);
        self.last = Some((kind, now));

        if folded {
            tracing::trace!(start = change.start, ?kind, "folded change into current record");
            BatchOutcome::Folded
        } else {
            tracing::trace!(start = change.start, ?kind, "recorded new change");
            log.add(change);
            BatchOutcome::Appended
        }
    }

    fn can_fold(&self, log: &HistoryLog, kind: EditKind, now: Instant) -> bool {
        let Some((last_kind, last_time)) = self.last else {
            return false;
        };
        last_kind == kind
            && kind != EditKind::Paste
            && now.saturating_duration_since(last_time) < self.window
            && !log.can_redo()
            && log.current().is_some_and(|record| !record.reconciled)
    }

    fn fold(log: &mut HistoryLog, change: &EditRecord, kind: EditKind) -> bool {
        let Some(current) = log.current_mut() else {
            return false;
        };
        match kind {
            EditKind::Insert => current.absorb_insertion(change),
            EditKind::Delete => current.absorb_deletion(change),
            EditKind::Paste => false,
        }
    }
}

impl Default for ChangeBatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_BATCH_WINDOW_MS))
    }
}
