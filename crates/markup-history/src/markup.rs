//! Lexical markup helpers.
//!
//! The history engine never parses markup. It only looks at single characters around edit
//! boundaries, classified by [`CharacterClass`].

use regex::Regex;
use std::sync::LazyLock;

/// Lexical role of a character at an edit boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterClass {
    /// `<`, the start of a tag.
    TagOpen,
    /// `>`, the end of a tag.
    TagClose,
    /// Whitespace that separates words or lines.
    Separator,
    /// Anything else.
    Other,
}

impl CharacterClass {
    /// Classify a single character.
    pub fn of(ch: char) -> Self {
        match ch {
            '<' => CharacterClass::TagOpen,
            '>' => CharacterClass::TagClose,
            ' ' | '\t' | '\n' | '\r' => CharacterClass::Separator,
            _ => CharacterClass::Other,
        }
    }
}

/// `true` for separators that end a line.
pub(crate) fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r')
}

static OPENING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9]*)\b[^>]*>").expect("valid tag regex"));

/// Whether `text` contains an element with matching opening and closing tags on one line,
/// e.g. `<p class="x">hello</p>`.
pub fn has_markup_tags(text: &str) -> bool {
    OPENING_TAG.captures_iter(text).any(|caps| {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            return false;
        };
        let rest = &text[whole.end()..];
        let line = rest.split('\n').next().unwrap_or_default();
        line.contains(&format!("</{}>", name.as_str()))
    })
}
