mod error;
pub use error::{Diagnostic, DiagnosticKind, ParserError, StructuralError};

mod line;
pub use line::{BytesLines, Line, LineError, LineReader};

mod content_line;
pub use content_line::{ContentLine, ContentLineError, ContentLineParams, ContentLineParser, LexError};

mod property;
pub use property::{decode_property, resolve_value_type};

mod component;
pub use component::{ComponentParser, Document, parse, parse_document};

/// What to do with a line that cannot be tokenized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LexErrorPolicy {
    /// Keep going and record a diagnostic on the enclosing component, or on the document.
    #[default]
    Record,
    /// Keep going without a trace in the result.
    Skip,
    /// Stop and return the error.
    Abort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserOptions {
    pub lex_errors: LexErrorPolicy,
}

impl ParserOptions {
    pub fn with_lex_errors(mut self, policy: LexErrorPolicy) -> Self {
        self.lex_errors = policy;
        self
    }
}
