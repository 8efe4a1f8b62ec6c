//! Reference text widget.
//!
//! [`MarkupBuffer`] is an in-memory [`TextWidget`] backed by a [`Rope`], with a caret and a
//! list of transient markers (the analogue of the underline spans an input method attaches
//! while suggesting corrections). Hosts without a widget of their own, and the test-suite,
//! drive the engine through it.

use crate::widget::{ApplyError, ChangeListener, TextWidget};
use ropey::Rope;
use std::ops::Range;

/// Rope-backed text buffer.
#[derive(Debug, Clone, Default)]
pub struct MarkupBuffer {
    rope: Rope,
    cursor: usize,
    transient: Vec<Range<usize>>,
}

impl MarkupBuffer {
    /// Create a buffer holding `text`, caret at the end.
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let cursor = rope.len_chars();
        Self {
            rope,
            cursor,
            transient: Vec::new(),
        }
    }

    /// Caret position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Attach a transient marker over `range`.
    pub fn add_transient_marker(&mut self, range: Range<usize>) {
        self.transient.push(range);
    }

    /// Currently attached transient markers.
    pub fn transient_markers(&self) -> &[Range<usize>] {
        &self.transient
    }

    fn shift_markers(&mut self, start: usize, end: usize, inserted: usize) {
        self.transient.retain(|marker| marker.end <= start || marker.start >= end);
        for marker in &mut self.transient {
            if marker.start >= end {
                marker.start = marker.start - (end - start) + inserted;
                marker.end = marker.end - (end - start) + inserted;
            }
        }
    }
}

impl TextWidget for MarkupBuffer {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn text_range(&self, start: usize, end: usize) -> Option<String> {
        if start > end || end > self.rope.len_chars() {
            return None;
        }
        Some(self.rope.slice(start..end).to_string())
    }

    fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        replacement: &str,
        listener: &mut dyn ChangeListener,
    ) -> Result<(), ApplyError> {
        let len = self.rope.len_chars();
        if start > end || end > len {
            return Err(ApplyError::OutOfRange { start, end, len });
        }

        let inserted = replacement.chars().count();
        listener.on_before_change(&self.rope.to_string(), start, end - start);
        self.rope.remove(start..end);
        self.rope.insert(start, replacement);
        self.shift_markers(start, end, inserted);
        self.cursor = start + inserted;
        listener.on_after_change(&self.rope.to_string(), start, inserted);
        Ok(())
    }

    fn set_cursor(&mut self, position: usize) {
        self.cursor = position.min(self.rope.len_chars());
    }

    fn clear_transient_formatting(&mut self) {
        self.transient.clear();
    }
}
