//! Linear edit history.
//!
//! [`HistoryLog`] keeps records in chronological order with a cursor that separates applied
//! records (undoable, `[0, cursor)`) from undone records (redoable, `[cursor, len)`).

use crate::record::EditRecord;

/// Ordered, cursor-indexed sequence of [`EditRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    records: Vec<EditRecord>,
    cursor: usize,
    max_size: Option<usize>,
}

impl HistoryLog {
    /// Create an empty, unbounded log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log bounded to `max_size` records.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size: Some(max_size),
            ..Self::default()
        }
    }

    /// Rebuild a log from its parts. `cursor` is clamped to `records.len()`.
    pub fn from_parts(records: Vec<EditRecord>, cursor: usize, max_size: Option<usize>) -> Self {
        let cursor = cursor.min(records.len());
        let mut log = Self {
            records,
            cursor,
            max_size,
        };
        log.trim();
        log
    }

    /// Append a record, discarding the redo tail first.
    pub fn add(&mut self, record: EditRecord) {
        self.records.truncate(self.cursor);
        self.records.push(record);
        self.cursor += 1;
        self.trim();
    }

    /// Record just before the cursor (the next one to undo).
    pub fn current(&self) -> Option<&EditRecord> {
        self.cursor.checked_sub(1).and_then(|i| self.records.get(i))
    }

    /// Mutable access to the record just before the cursor.
    pub fn current_mut(&mut self) -> Option<&mut EditRecord> {
        let index = self.cursor.checked_sub(1)?;
        self.records.get_mut(index)
    }

    /// Record just after the cursor (the next one to redo).
    pub fn upcoming(&self) -> Option<&EditRecord> {
        self.records.get(self.cursor)
    }

    /// Step the cursor back and return the record to invert.
    pub fn previous(&mut self) -> Option<&EditRecord> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.records.get(self.cursor)
    }

    /// Return the record to reapply and step the cursor forward.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&EditRecord> {
        let record = self.records.get(self.cursor)?;
        self.cursor += 1;
        Some(record)
    }

    /// Whether there is an applied record.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether there is an undone record.
    pub fn can_redo(&self) -> bool {
        self.cursor < self.records.len()
    }

    /// Number of undoable records.
    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    /// Number of redoable records.
    pub fn redo_depth(&self) -> usize {
        self.records.len() - self.cursor
    }

    /// Cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// All records, applied and undone.
    pub fn records(&self) -> &[EditRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if the log holds no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Size bound, if any.
    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Drop every record and reset the cursor.
    pub fn clear(&mut self) {
        self.records.clear();
        self.cursor = 0;
    }

    /// Set (or lift) the size bound and trim immediately.
    pub fn set_max_history_size(&mut self, max_size: Option<usize>) {
        self.max_size = max_size;
        self.trim();
    }

    /// Set the `reconciled` flag of the oldest record.
    pub fn mark_first_record_as_boundary(&mut self, boundary: bool) {
        if let Some(first) = self.records.first_mut() {
            first.reconciled = boundary;
        }
    }

    /// Rewrite the applied prefix in place.
    ///
    /// The redo tail is detached while `f` runs and reattached afterwards; the cursor is reset
    /// to the new length of the applied prefix.
    pub(crate) fn rewrite_applied<R>(&mut self, f: impl FnOnce(&mut Vec<EditRecord>) -> R) -> R {
        let tail = self.records.split_off(self.cursor);
        let result = f(&mut self.records);
        self.cursor = self.records.len();
        self.records.extend(tail);
        result
    }

    fn trim(&mut self) {
        let Some(max_size) = self.max_size else {
            return;
        };
        if self.records.len() <= max_size {
            return;
        }
        let excess = self.records.len() - max_size;
        self.records.drain(..excess);
        self.cursor = self.cursor.saturating_sub(excess);
    }
}
