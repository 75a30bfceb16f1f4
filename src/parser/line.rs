//! Read raw bytes and unfold them into logical lines.
//!
//! A physical line that starts with a single space or horizontal tab continues
//! the previous one; the line break and that one whitespace character are
//! removed. Both `CRLF` and bare `LF` are accepted. Unfolding happens on bytes
//! and only the assembled logical line is decoded as UTF-8, so a fold that
//! lands inside a multi-octet sequence is reassembled correctly.
//!
//! # Examples
//!
//! ```rust
//! let input = b"DESCRIPTION:This is a lo\r\n ng description\r\nSUMMARY:x\r\n";
//! let lines: Vec<_> = calcodec::LineReader::from_slice(input)
//!     .map(|line| line.unwrap().to_string())
//!     .collect();
//! assert_eq!(lines, ["DESCRIPTION:This is a long description", "SUMMARY:x"]);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::iter::Peekable;

const BOM: &[u8] = b"\xef\xbb\xbf";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("Line {0}: Invalid UTF-8 sequence.")]
    InvalidUtf8(usize),
}

/// Iterator over the physical lines of a byte slice, line terminators stripped.
#[derive(Debug, Clone)]
pub struct BytesLines<'a> {
    rest: &'a [u8],
}

impl<'a> BytesLines<'a> {
    pub fn new(slice: &'a [u8]) -> Self {
        Self { rest: slice }
    }
}

impl<'a> Iterator for BytesLines<'a> {
    type Item = Cow<'a, [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, rest) = match self.rest.iter().position(|&b| b == b'\n') {
            Some(pos) => (&self.rest[..pos], &self.rest[pos + 1..]),
            None => (self.rest, &self.rest[self.rest.len()..]),
        };
        self.rest = rest;
        Some(Cow::Borrowed(line.strip_suffix(b"\r").unwrap_or(line)))
    }
}

/// One unfolded logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    pub inner: Cow<'a, str>,
    number: usize,
}

impl<'a> Line<'a> {
    pub fn new(inner: Cow<'a, str>, number: usize) -> Self {
        Self { inner, number }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Number of the first physical line, starting at 1.
    #[inline]
    pub fn number(&self) -> usize {
        self.number
    }
}

impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

#[inline]
fn is_continuation(line: &[u8]) -> bool {
    matches!(line.first(), Some(b' ' | b'\t'))
}

pub struct LineReader<'a, T: Iterator<Item = Cow<'a, [u8]>>> {
    lines: Peekable<T>,
    number: usize,
}

impl<'a> LineReader<'a, BytesLines<'a>> {
    pub fn from_slice(slice: &'a [u8]) -> Self {
        let slice = slice.strip_prefix(BOM).unwrap_or(slice);
        Self::new(BytesLines::new(slice))
    }
}

impl<'a, T: Iterator<Item = Cow<'a, [u8]>>> LineReader<'a, T> {
    pub fn new(lines: T) -> Self {
        Self {
            lines: lines.peekable(),
            number: 0,
        }
    }

    fn decode(bytes: Cow<'a, [u8]>, number: usize) -> Result<Line<'a>, LineError> {
        let inner = match bytes {
            Cow::Borrowed(bytes) => Cow::Borrowed(
                std::str::from_utf8(bytes).map_err(|_| LineError::InvalidUtf8(number))?,
            ),
            Cow::Owned(bytes) => {
                Cow::Owned(String::from_utf8(bytes).map_err(|_| LineError::InvalidUtf8(number))?)
            }
        };
        Ok(Line::new(inner, number))
    }
}

impl<'a, T: Iterator<Item = Cow<'a, [u8]>>> Iterator for LineReader<'a, T> {
    type Item = Result<Line<'a>, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut bytes = loop {
            let line = self.lines.next()?;
            self.number += 1;
            if line.is_empty() {
                continue;
            }
            // A continuation without anything to continue is kept as its own line
            break if is_continuation(&line) {
                match line {
                    Cow::Borrowed(line) => Cow::Borrowed(&line[1..]),
                    Cow::Owned(line) => Cow::Owned(line[1..].to_vec()),
                }
            } else {
                line
            };
        };
        let number = self.number;

        while let Some(next) = self.lines.next_if(|next| is_continuation(next)) {
            self.number += 1;
            bytes.to_mut().extend_from_slice(&next[1..]);
        }

        Some(Self::decode(bytes, number))
    }
}
