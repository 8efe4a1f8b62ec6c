//! The undo/redo engine.
//!
//! [`HistoryManager`] owns a [`TextWidget`], records every change the widget reports, and
//! replays history onto it on undo/redo. Replays go through the widget's regular
//! `replace_range`, so the widget notifies again; those notifications are suppressed by a
//! scoped guard and never reach the log.

use crate::batcher::{BatchOutcome, ChangeBatcher, Clock, system_clock};
use crate::config::HistoryConfig;
use crate::log::HistoryLog;
use crate::markup::has_markup_tags;
use crate::persistence::{
    KeyValueStore, RestoreError, RestoreOutcome, restore_history, store_history,
};
use crate::reconcile::BoundaryReconciler;
use crate::record::EditRecord;
use crate::state::{HistoryChange, HistoryChangeKind, HistoryState, Subscribers};
use crate::text::char_slice;
use crate::widget::{ApplyError, ChangeListener, TextWidget};
use std::time::Duration;

/// Text captured by a "before change" notification, waiting for its "after change".
#[derive(Debug, Clone)]
struct PendingChange {
    start: usize,
    before: String,
}

/// Turns widget notifications into log records.
struct Recorder {
    log: HistoryLog,
    batcher: ChangeBatcher,
    clock: Clock,
    pending: Option<PendingChange>,
    applying: bool,
    last_outcome: Option<BatchOutcome>,
}

impl Recorder {
    fn new(config: &HistoryConfig) -> Self {
        let log = match config.max_history_size {
            Some(max_size) => HistoryLog::with_max_size(max_size),
            None => HistoryLog::new(),
        };
        Self {
            log,
            batcher: ChangeBatcher::new(config.batch_window()),
            clock: system_clock(),
            pending: None,
            applying: false,
            last_outcome: None,
        }
    }

    /// Forget any half-observed change and stop batching into the current record.
    fn interrupt(&mut self) {
        self.batcher.reset();
        self.pending = None;
    }

    fn record(&mut self, record: EditRecord) {
        let start = record.start;
        let now = (self.clock)();
        let outcome = self.batcher.record(&mut self.log, record, now);
        tracing::debug!(start, ?outcome, "recorded change");
        self.last_outcome = Some(outcome);
    }
}

impl ChangeListener for Recorder {
    fn on_before_change(&mut self, text: &str, start: usize, removed_len: usize) {
        if self.applying {
            return;
        }
        self.pending = char_slice(text, start, removed_len).map(|before| PendingChange {
            start,
            before,
        });
        if self.pending.is_none() {
            tracing::warn!(start, removed_len, "before-change notification out of range");
        }
    }

    fn on_after_change(&mut self, text: &str, start: usize, inserted_len: usize) {
        if self.applying {
            return;
        }
        let Some(pending) = self.pending.take() else {
            tracing::warn!(start, "after-change notification without a matching before-change");
            return;
        };
        if pending.start != start {
            tracing::warn!(
                expected = pending.start,
                start,
                "after-change notification at a different offset"
            );
            return;
        }
        let Some(after) = char_slice(text, start, inserted_len) else {
            tracing::warn!(start, inserted_len, "after-change notification out of range");
            return;
        };

        self.record(EditRecord::new(start, pending.before, after));
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("log", &self.log)
            .field("batcher", &self.batcher)
            .field("pending", &self.pending)
            .field("applying", &self.applying)
            .finish_non_exhaustive()
    }
}

/// Marks the recorder as applying history for as long as it lives.
struct ReplayGuard<'a> {
    recorder: &'a mut Recorder,
}

impl<'a> ReplayGuard<'a> {
    fn new(recorder: &'a mut Recorder) -> Self {
        recorder.applying = true;
        Self { recorder }
    }
}

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.recorder.applying = false;
    }
}

impl ChangeListener for ReplayGuard<'_> {
    fn on_before_change(&mut self, text: &str, start: usize, removed_len: usize) {
        self.recorder.on_before_change(text, start, removed_len);
    }

    fn on_after_change(&mut self, text: &str, start: usize, inserted_len: usize) {
        self.recorder.on_after_change(text, start, inserted_len);
    }
}

/// Undo/redo engine bound to a text widget.
///
/// # Example
///
/// ```rust
/// use markup_history::{HistoryConfig, HistoryManager, MarkupBuffer, TextWidget};
///
/// let mut manager =
///     HistoryManager::with_config(MarkupBuffer::new(""), HistoryConfig::unbatched());
/// manager.edit(0, 0, "<p>").unwrap();
/// manager.edit(3, 3, "aaaa").unwrap();
/// manager.edit(7, 7, "</p>").unwrap();
///
/// assert!(manager.undo());
/// assert_eq!(manager.widget().text(), "<p>");
/// assert!(manager.undo());
/// assert_eq!(manager.widget().text(), "");
/// assert!(manager.redo());
/// assert_eq!(manager.widget().text(), "<p>");
/// ```
#[derive(Debug)]
pub struct HistoryManager<W: TextWidget> {
    widget: W,
    recorder: Recorder,
    subscribers: Subscribers,
    undo_floor: usize,
}

impl<W: TextWidget> HistoryManager<W> {
    /// Attach to `widget` with the default configuration.
    pub fn new(widget: W) -> Self {
        Self::with_config(widget, HistoryConfig::default())
    }

    /// Attach to `widget` with `config`.
    pub fn with_config(widget: W, config: HistoryConfig) -> Self {
        Self {
            widget,
            recorder: Recorder::new(&config),
            subscribers: Subscribers::default(),
            undo_floor: 0,
        }
    }

    /// Replace the clock driving the batching window.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.recorder.clock = clock;
        self
    }

    /// The attached widget.
    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Mutable access to the widget.
    ///
    /// Changes made through this reference are not recorded on their own. Report them with
    /// [`record_external`](Self::record_external), or forward the widget's notifications
    /// through the [`ChangeListener`] impl.
    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Detach and return the widget, dropping the history.
    pub fn into_widget(self) -> W {
        self.widget
    }

    /// Replace `[start, end)` of the widget with `text` as a user edit and record it.
    pub fn edit(&mut self, start: usize, end: usize, text: &str) -> Result<(), ApplyError> {
        self.widget
            .replace_range(start, end, text, &mut self.recorder)?;
        self.flush_recorded();
        Ok(())
    }

    /// Record a change the widget has already applied without notifying the manager:
    /// `removed` at `start` was replaced by `inserted`.
    ///
    /// The change is batched like any other. Fails with [`ApplyError::ContentMismatch`] when
    /// the widget does not hold `inserted` at `start`, in which case nothing is recorded.
    ///
    /// ```rust
    /// use markup_history::{HistoryManager, MarkupBuffer, TextWidget};
    ///
    /// let mut manager = HistoryManager::new(MarkupBuffer::new("<b></b>"));
    /// manager.widget_mut().replace_range(3, 3, "bold", &mut ()).unwrap();
    /// manager.record_external(3, "", "bold").unwrap();
    ///
    /// assert!(manager.undo());
    /// assert_eq!(manager.widget().text(), "<b></b>");
    /// ```
    pub fn record_external(
        &mut self,
        start: usize,
        removed: &str,
        inserted: &str,
    ) -> Result<(), ApplyError> {
        let end = start + inserted.chars().count();
        if self.widget.text_range(start, end).as_deref() != Some(inserted) {
            return Err(ApplyError::ContentMismatch { start });
        }
        self.recorder.pending = None;
        self.recorder.record(EditRecord::new(start, removed, inserted));
        self.flush_recorded();
        Ok(())
    }

    /// Undo the latest boundary-aligned step. Returns `false` if nothing was undone.
    pub fn undo(&mut self) -> bool {
        self.try_undo().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "undo aborted");
            false
        })
    }

    /// Redo the next undone step. Returns `false` if nothing was redone.
    pub fn redo(&mut self) -> bool {
        self.try_redo().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "redo aborted");
            false
        })
    }

    /// Like [`undo`](Self::undo), but reports why the widget refused the replay.
    ///
    /// On error the log is left as reconciled but otherwise unchanged.
    pub fn try_undo(&mut self) -> Result<bool, ApplyError> {
        self.recorder.interrupt();
        if !self.recorder.log.can_undo() {
            return Ok(false);
        }

        let report = BoundaryReconciler::reconcile(&mut self.recorder.log);
        tracing::debug!(?report, "reconciled history");

        let Some(record) = self.recorder.log.current().cloned() else {
            return Ok(false);
        };
        if record.start < self.undo_floor {
            tracing::debug!(
                start = record.start,
                floor = self.undo_floor,
                "undo stopped at floor"
            );
            return Ok(false);
        }

        self.replay(record.start, record.after_end(), &record.after, &record.before)?;
        self.recorder.log.previous();
        self.widget.set_cursor(record.start + record.before_len());
        self.subscribers
            .notify(HistoryChangeKind::Undone, &self.recorder.log);
        Ok(true)
    }

    /// Like [`redo`](Self::redo), but reports why the widget refused the replay.
    pub fn try_redo(&mut self) -> Result<bool, ApplyError> {
        self.recorder.interrupt();
        let Some(record) = self.recorder.log.upcoming().cloned() else {
            return Ok(false);
        };

        let end = record.start + record.before_len();
        self.replay(record.start, end, &record.before, &record.after)?;
        self.recorder.log.next();
        self.widget.set_cursor(record.after_end());
        self.subscribers
            .notify(HistoryChangeKind::Redone, &self.recorder.log);
        Ok(true)
    }

    /// Drop every record.
    pub fn clear_history(&mut self) {
        self.recorder.log.clear();
        self.recorder.interrupt();
        self.subscribers
            .notify(HistoryChangeKind::Cleared, &self.recorder.log);
    }

    /// Whether there is a record to undo.
    pub fn can_undo(&self) -> bool {
        self.recorder.log.can_undo()
    }

    /// Whether there is a record to redo.
    pub fn can_redo(&self) -> bool {
        self.recorder.log.can_redo()
    }

    /// Bound the history to `max_size` records (`None` for unbounded); trims immediately.
    pub fn set_max_history_size(&mut self, max_size: Option<usize>) {
        self.recorder.log.set_max_history_size(max_size);
    }

    /// Change the batching window.
    pub fn set_batch_window(&mut self, window: Duration) {
        self.recorder.batcher.set_window(window);
    }

    /// Set the `reconciled` flag of the oldest record.
    pub fn mark_first_record_as_boundary(&mut self, boundary: bool) {
        self.recorder.log.mark_first_record_as_boundary(boundary);
    }

    /// Refuse undo of any record starting before `offset`.
    pub fn set_undo_floor(&mut self, offset: usize) {
        self.undo_floor = offset;
    }

    /// Current undo floor.
    pub fn undo_floor(&self) -> usize {
        self.undo_floor
    }

    /// Load `text` into the widget as the document's first record.
    ///
    /// The history is cleared first. When `text` contains a matched element the record is
    /// marked as a boundary, so one undo removes the whole document instead of its last word.
    pub fn seed_document(&mut self, text: &str) -> Result<(), ApplyError> {
        self.recorder.log.clear();
        self.recorder.interrupt();
        let len = self.widget.len_chars();
        self.edit(0, len, text)?;
        self.recorder.interrupt();
        self.mark_first_record_as_boundary(has_markup_tags(text));
        Ok(())
    }

    /// The history log.
    pub fn history(&self) -> &HistoryLog {
        &self.recorder.log
    }

    /// Snapshot of the undo/redo state.
    pub fn state(&self) -> HistoryState {
        HistoryState::of(&self.recorder.log, self.subscribers.version())
    }

    /// Call `callback` after every change of the history.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&HistoryChange) + Send + 'static,
    {
        self.subscribers.subscribe(Box::new(callback));
    }

    /// Whether a history replay is being applied to the widget.
    pub fn is_applying_history(&self) -> bool {
        self.recorder.applying
    }

    /// Save the history under `prefix`.
    pub fn store(&self, store: &mut dyn KeyValueStore, prefix: &str) {
        store_history(&self.recorder.log, store, prefix, &self.widget.text());
    }

    /// Restore the history saved under `prefix`. Returns `false` (with an empty history) if
    /// the stored history does not belong to the current buffer or is malformed.
    pub fn restore(&mut self, store: &dyn KeyValueStore, prefix: &str) -> bool {
        self.try_restore(store, prefix).is_ok()
    }

    /// Like [`restore`](Self::restore), but reports what was restored or why it failed.
    pub fn try_restore(
        &mut self,
        store: &dyn KeyValueStore,
        prefix: &str,
    ) -> Result<RestoreOutcome, RestoreError> {
        self.recorder.interrupt();
        let result = restore_history(&mut self.recorder.log, store, prefix, &self.widget.text());
        let kind = match result {
            Ok(_) => HistoryChangeKind::Restored,
            Err(_) => HistoryChangeKind::Cleared,
        };
        self.subscribers.notify(kind, &self.recorder.log);
        result
    }

    fn replay(
        &mut self,
        start: usize,
        end: usize,
        expected: &str,
        replacement: &str,
    ) -> Result<(), ApplyError> {
        let len = self.widget.len_chars();
        if start > end || end > len {
            return Err(ApplyError::OutOfRange { start, end, len });
        }
        if self.widget.text_range(start, end).as_deref() != Some(expected) {
            return Err(ApplyError::ContentMismatch { start });
        }

        let mut guard = ReplayGuard::new(&mut self.recorder);
        self.widget
            .replace_range(start, end, replacement, &mut guard)?;
        drop(guard);
        self.widget.clear_transient_formatting();
        Ok(())
    }

    fn flush_recorded(&mut self) {
        match self.recorder.last_outcome.take() {
            Some(BatchOutcome::Appended | BatchOutcome::Folded) => {
                self.subscribers
                    .notify(HistoryChangeKind::Recorded, &self.recorder.log);
            }
            Some(BatchOutcome::Ignored) | None => {}
        }
    }
}

/// Feeds notifications of changes made outside [`HistoryManager::edit`], e.g. through
/// [`HistoryManager::widget_mut`].
///
/// The manager cannot be passed as the listener of its own widget, so notifications are
/// forwarded by hand around the change:
///
/// ```rust
/// use markup_history::{ChangeListener, HistoryManager, MarkupBuffer, TextWidget};
///
/// let mut manager = HistoryManager::new(MarkupBuffer::new("<b></b>"));
/// let before = manager.widget().text();
/// manager.on_before_change(&before, 3, 0);
/// manager.widget_mut().replace_range(3, 3, "bold", &mut ()).unwrap();
/// let after = manager.widget().text();
/// manager.on_after_change(&after, 3, 4);
///
/// assert!(manager.can_undo());
/// ```
impl<W: TextWidget> ChangeListener for HistoryManager<W> {
    fn on_before_change(&mut self, text: &str, start: usize, removed_len: usize) {
        self.recorder.on_before_change(text, start, removed_len);
    }

    fn on_after_change(&mut self, text: &str, start: usize, inserted_len: usize) {
        self.recorder.on_after_change(text, start, inserted_len);
        self.flush_recorded();
    }
}
