//! Character-offset and case-folding helpers shared by matcher and surfaces.
//!
//! Caret positions throughout the engine are counted in `char`s, never bytes.

/// Case-fold for matching. Full Unicode lowercase; good enough for macro names.
pub fn fold(s: &str) -> String {
    s.to_lowercase()
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `char_idx`-th character, clamped to `s.len()`.
pub fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map_or(s.len(), |(i, _)| i)
}

/// The first `n` characters of `s`.
pub fn char_prefix(s: &str, n: usize) -> &str {
    &s[..byte_index(s, n)]
}

/// Everything after the first `n` characters of `s`.
pub fn char_suffix(s: &str, n: usize) -> &str {
    &s[byte_index(s, n)..]
}

/// Last whitespace-separated token of `text`.
/// Empty when `text` is empty or ends in whitespace.
pub fn trailing_token(text: &str) -> &str {
    match text.rfind(char::is_whitespace) {
        Some(i) => {
            let ws_len = text[i..].chars().next().map_or(1, char::len_utf8);
            &text[i + ws_len..]
        }
        None => text,
    }
}

/// Case-insensitive `strip_prefix`, comparing character by character.
/// Returns the untouched remainder of `text` after `prefix`.
pub fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = text.char_indices();
    for p in prefix.chars() {
        let (_, t) = rest.next()?;
        if !chars_eq_ci(p, t) {
            return None;
        }
    }
    Some(rest.next().map_or("", |(i, _)| &text[i..]))
}

/// Case-insensitive `ends_with`.
pub fn ends_with_ci(text: &str, suffix: &str) -> bool {
    let n = char_len(suffix);
    let len = char_len(text);
    if n > len {
        return false;
    }
    strip_prefix_ci(char_suffix(text, len - n), suffix).is_some_and(str::is_empty)
}

fn chars_eq_ci(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
