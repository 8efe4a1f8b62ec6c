/// Number of `char`s in `text`.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `char_idx`-th character, or `text.len()` when `char_idx` is at the end.
pub(crate) fn byte_index(text: &str, char_idx: usize) -> Option<usize> {
    if char_idx == 0 {
        return Some(0);
    }
    match text.char_indices().nth(char_idx) {
        Some((byte, _)) => Some(byte),
        None if char_len(text) == char_idx => Some(text.len()),
        None => None,
    }
}

/// Copy `len` characters starting at character offset `start`.
///
/// Returns `None` if the range runs past the end of `text`.
pub(crate) fn char_slice(text: &str, start: usize, len: usize) -> Option<String> {
    let from = byte_index(text, start)?;
    let to = byte_index(&text[from..], len)? + from;
    Some(text[from..to].to_string())
}

/// Suffix of `text` starting at character offset `start`.
pub(crate) fn char_suffix(text: &str, start: usize) -> &str {
    match byte_index(text, start) {
        Some(byte) => &text[byte..],
        None => "",
    }
}
