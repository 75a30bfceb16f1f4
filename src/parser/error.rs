use std::fmt;

use crate::{parser::ContentLineError, types::ValueDecodeError};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ParserError {
    #[error("empty input")]
    EmptyInput,
    #[error("too many components in input, expected one")]
    TooManyComponents,
    #[error("content line error: {0}")]
    ContentLineError(#[from] ContentLineError),
}

/// Unbalanced or mismatched `BEGIN`/`END` lines and property lines without a
/// component to hold them.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("END:{0} without a matching BEGIN")]
    UnmatchedEnd(String),
    #[error("END:{found} does not close the open {expected}")]
    MismatchedEnd { expected: String, found: String },
    #[error("{0} was never closed")]
    MissingEnd(String),
    #[error("BEGIN without a component name")]
    MissingComponentName,
    #[error("property {0} outside of any component")]
    OrphanProperty(String),
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum DiagnosticKind {
    #[error(transparent)]
    Lex(#[from] ContentLineError),
    #[error(transparent)]
    Value(#[from] ValueDecodeError),
    #[error(transparent)]
    Structure(#[from] StructuralError),
}

/// Something that went wrong while building a component tree and was recovered from.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Physical line the problem was found on, when known.
    pub line: Option<usize>,
    /// Name of the property the problem belongs to.
    pub property: Option<String>,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn lex(err: ContentLineError) -> Self {
        Self {
            line: Some(err.line()),
            property: None,
            kind: err.into(),
        }
    }

    pub fn value(property: impl Into<String>, line: usize, err: ValueDecodeError) -> Self {
        Self {
            line: Some(line),
            property: Some(property.into()),
            kind: err.into(),
        }
    }

    pub fn structure(line: Option<usize>, err: StructuralError) -> Self {
        Self {
            line,
            property: None,
            kind: err.into(),
        }
    }

    #[inline]
    pub fn is_structural(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Structure(_))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // lex errors carry their line number already
        if let DiagnosticKind::Lex(err) = &self.kind {
            return err.fmt(f);
        }
        match (self.line, &self.property) {
            (Some(line), Some(property)) => write!(f, "Line {line} ({property}): {}", self.kind),
            (Some(line), None) => write!(f, "Line {line}: {}", self.kind),
            (None, Some(property)) => write!(f, "{property}: {}", self.kind),
            (None, None) => self.kind.fmt(f),
        }
    }
}
