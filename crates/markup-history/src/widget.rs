//! Text widget boundary.
//!
//! The history engine does not own text. A [`TextWidget`] owns the buffer and caret, reports
//! every change through a [`ChangeListener`] (one "before" and one "after" call per change),
//! and applies the replace instructions the engine issues on undo/redo.

use thiserror::Error;

/// Errors returned by a widget when a replace instruction cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("range {start}..{end} is out of bounds for a buffer of {len} characters")]
    /// The range does not fit the current buffer.
    OutOfRange {
        /// Start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
        /// Buffer length in characters.
        len: usize,
    },

    #[error("buffer content at {start} no longer matches the history")]
    /// The buffer was changed outside of the history.
    ContentMismatch {
        /// Start character offset of the expected text.
        start: usize,
    },

    #[error("replace rejected by widget: {0}")]
    /// The widget refused the edit.
    Rejected(String),
}

/// Receiver of raw change notifications.
///
/// Offsets and lengths are in characters; `text` is the full buffer text at the time of the
/// call (before the change for `on_before_change`, after it for `on_after_change`).
pub trait ChangeListener {
    /// Called right before `removed_len` characters at `start` are replaced.
    fn on_before_change(&mut self, text: &str, start: usize, removed_len: usize);

    /// Called right after `inserted_len` characters were inserted at `start`.
    fn on_after_change(&mut self, text: &str, start: usize, inserted_len: usize);
}

/// Listener that ignores every notification.
impl ChangeListener for () {
    fn on_before_change(&mut self, _text: &str, _start: usize, _removed_len: usize) {}

    fn on_after_change(&mut self, _text: &str, _start: usize, _inserted_len: usize) {}
}

/// A mutable text buffer with a caret.
pub trait TextWidget {
    /// Buffer length in characters.
    fn len_chars(&self) -> usize;

    /// Full buffer text.
    fn text(&self) -> String;

    /// Text in `[start, end)`, or `None` if the range is out of bounds.
    fn text_range(&self, start: usize, end: usize) -> Option<String>;

    /// Replace `[start, end)` with `replacement`, notifying `listener` before and after.
    fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        replacement: &str,
        listener: &mut dyn ChangeListener,
    ) -> Result<(), ApplyError>;

    /// Move the caret.
    fn set_cursor(&mut self, position: usize);

    /// Remove inline markers the widget may have attached during the last replace
    /// (spell-check underlines and similar).
    fn clear_transient_formatting(&mut self);
}
