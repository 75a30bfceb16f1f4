//! Backslash escaping for TEXT values and separator-aware splitting.
//!
//! TEXT values (RFC 5545 3.3.11, RFC 6350 3.4) escape exactly four things:
//! backslash, semicolon, comma and newline. Structured and list values are split
//! first on the separators that were *not* escaped and only then unescaped, so a
//! literal `\,` inside a category never fragments it.
//!
//! All functions are a single left-to-right scan over the input.

use crate::{PARAM_DELIMITER, PARAM_VALUE_DELIMITER};

const ESCAPE: char = '\\';

/// Escape a TEXT value for use in a content line.
///
/// ```rust
/// assert_eq!(calcodec::escape::escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");
/// ```
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            ESCAPE => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_text`].
///
/// Only `\\`, `\;`, `\,`, `\n` and `\N` are touched. Any other backslash sequence
/// and any percent-encoded octet (`%3A`) is kept as written.
pub fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != ESCAPE {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(ESCAPE) => out.push(ESCAPE),
            Some(';') => out.push(';'),
            Some(',') => out.push(','),
            Some('n' | 'N') => out.push('\n'),
            Some(other) => {
                out.push(ESCAPE);
                out.push(other);
            }
            None => out.push(ESCAPE),
        }
    }
    out
}

/// Split `text` on every `separator` that is not escaped by a backslash.
///
/// A backslash escapes the character right after it (including another
/// backslash), so `a\\;b` splits after the double backslash while `a\;b` does not.
/// The returned slices are still escaped.
pub fn split_unescaped(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (pos, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == separator {
            parts.push(&text[start..pos]);
            start = pos + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Split a structured value into its fields.
pub fn split_on_unescaped_semicolon(text: &str) -> Vec<&str> {
    split_unescaped(text, PARAM_DELIMITER)
}

/// Split a multi-valued TEXT (or one structured field) into its items.
pub fn split_on_unescaped_comma(text: &str) -> Vec<&str> {
    split_unescaped(text, PARAM_VALUE_DELIMITER)
}
