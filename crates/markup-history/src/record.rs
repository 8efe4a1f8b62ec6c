//! Edit records.
//!
//! An [`EditRecord`] is the atomic unit of history: a start offset plus the text that was
//! replaced and the text that replaced it. All offsets and lengths are expressed in
//! **character offsets** (Unicode scalar values), matching what the text widget reports.

use crate::text::{char_len, char_suffix};

/// Classification of a raw change by which side of the record is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Nothing was removed, text was inserted.
    Insert,
    /// Text was removed, nothing was inserted.
    Delete,
    /// Text was replaced (both sides non-empty), e.g. a paste over a selection.
    Paste,
}

impl EditKind {
    /// Classify a `(before, after)` pair.
    pub fn classify(before: &str, after: &str) -> Self {
        match (before.is_empty(), after.is_empty()) {
            (false, true) => EditKind::Delete,
            (true, false) => EditKind::Insert,
            _ => EditKind::Paste,
        }
    }
}

/// One logged change.
///
/// Semantics:
/// - `before` occupied `[start, start + len(before))` prior to the change.
/// - `after` occupies `[start, start + len(after))` after the change.
/// - `reconciled` marks a record that was collapsed onto a structural boundary and must not
///   be split again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    /// Start character offset of the change.
    pub start: usize,
    /// Replaced text (empty for a pure insertion).
    pub before: String,
    /// Replacing text (empty for a pure deletion).
    pub after: String,
    /// Whether the record is already boundary-aligned.
    pub reconciled: bool,
}

impl EditRecord {
    /// Create an unreconciled record.
    pub fn new(start: usize, before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            start,
            before: before.into(),
            after: after.into(),
            reconciled: false,
        }
    }

    /// Create a pure insertion.
    pub fn insert(start: usize, text: impl Into<String>) -> Self {
        Self::new(start, String::new(), text)
    }

    /// Create a pure deletion.
    pub fn delete(start: usize, text: impl Into<String>) -> Self {
        Self::new(start, text, String::new())
    }

    /// Builder-style setter for the `reconciled` flag.
    pub fn with_reconciled(mut self, reconciled: bool) -> Self {
        self.reconciled = reconciled;
        self
    }

    /// Length of `before` in characters.
    pub fn before_len(&self) -> usize {
        char_len(&self.before)
    }

    /// Length of `after` in characters.
    pub fn after_len(&self) -> usize {
        char_len(&self.after)
    }

    /// Action kind of this record.
    pub fn kind(&self) -> EditKind {
        EditKind::classify(&self.before, &self.after)
    }

    /// `true` if the record only adds text.
    pub fn is_growth(&self) -> bool {
        self.before.is_empty() && !self.after.is_empty()
    }

    /// `true` if the record only removes text.
    pub fn is_shrink(&self) -> bool {
        !self.before.is_empty() && self.after.is_empty()
    }

    /// Exclusive end offset of the `after` text in the post-change buffer.
    pub fn after_end(&self) -> usize {
        self.start + self.after_len()
    }

    /// `true` if applying `other` right after `self` leaves the buffer unchanged.
    pub fn is_inverse_of(&self, other: &EditRecord) -> bool {
        self.start == other.start && self.before == other.after && self.after == other.before
    }

    /// Reduce the record to its net insertion or deletion.
    ///
    /// When one side is a prefix of the other, that shared prefix is dropped and `start` moves
    /// past it, leaving a pure insertion or deletion. A replace with no shared prefix, or one
    /// that keeps the length, is atomic and becomes reconciled as-is.
    ///
    /// Returns `false` when the record is a no-op and should be dropped.
    pub(crate) fn normalize(&mut self) -> bool {
        if self.before == self.after {
            return false;
        }

        let before_len = self.before_len();
        let after_len = self.after_len();
        if before_len == after_len {
            self.reconciled = true;
            return true;
        }

        if after_len > before_len && self.after.starts_with(self.before.as_str()) {
            self.after = char_suffix(&self.after, before_len).to_string();
            self.start += before_len;
            self.before.clear();
        } else if before_len > after_len && self.before.starts_with(self.after.as_str()) {
            self.before = char_suffix(&self.before, after_len).to_string();
            self.start += after_len;
            self.after.clear();
        } else if !self.before.is_empty() && !self.after.is_empty() {
            self.reconciled = true;
        }
        true
    }

    /// Fold a later insertion into this one if it continues typing at the end of `self`.
    pub(crate) fn absorb_insertion(&mut self, later: &EditRecord) -> bool {
        if !self.is_growth() || !later.is_growth() || later.start != self.after_end() {
            return false;
        }
        self.after.push_str(&later.after);
        true
    }

    /// Fold a later deletion into this one if the two removed ranges touch.
    ///
    /// A backspace (later range ends where this one started) prepends and moves `start` back;
    /// a forward delete at the same offset appends.
    pub(crate) fn absorb_deletion(&mut self, later: &EditRecord) -> bool {
        if !self.is_shrink() || !later.is_shrink() {
            return false;
        }
        if later.start + later.before_len() == self.start {
            self.before.insert_str(0, &later.before);
            self.start = later.start;
            true
        } else if later.start == self.start {
            self.before.push_str(&later.before);
            true
        } else {
            false
        }
    }
}
