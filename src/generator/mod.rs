//! Serialization back to text.
//!
//! [`Emitter`] turns content lines, properties and component trees into
//! folded, `CRLF` terminated lines. Values go through the codec their
//! `value_type` names, so `TZID`, `ENCODING` and `VALUE` parameters are kept in
//! line with the value. Broken and untyped values are written exactly as read.

use itertools::Itertools;

use crate::{
    PARAM_DELIMITER, PARAM_NAME_DELIMITER, PARAM_QUOTE, PARAM_VALUE_DELIMITER, VALUE_DELIMITER,
    component::Component,
    parser::{ContentLine, Document},
    property::Property,
    registry::{ComponentShape, Registry, global},
};

mod component;
pub use component::encode_property;

/// Maximum line length in octets, not counting the line break.
const MAX_LINE_OCTETS: usize = 75;

pub trait Emitter {
    fn generate(&self) -> String;
}

impl<T: Emitter> Emitter for Vec<T> {
    fn generate(&self) -> String {
        self.iter().map(Emitter::generate).collect()
    }
}

/// Fold `line` so that no physical line exceeds 75 octets and terminate it with `CRLF`.
///
/// Continuation lines start with a single space. Folds only happen between
/// characters, never inside a multi-byte sequence.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return format!("{line}\r\n");
    }

    let mut folded = String::with_capacity(line.len() + (line.len() / MAX_LINE_OCTETS + 1) * 3);
    let mut rest = line;
    // Continuation lines lose one octet to the leading space
    let mut limit = MAX_LINE_OCTETS;
    while rest.len() > limit {
        let mut end = limit;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (chunk, remainder) = rest.split_at(end);
        folded.push_str(chunk);
        folded.push_str("\r\n ");
        rest = remainder;
        limit = MAX_LINE_OCTETS - 1;
    }
    folded.push_str(rest);
    folded.push_str("\r\n");
    folded
}

#[inline]
fn needs_quotes(value: &str) -> bool {
    value.contains([PARAM_DELIMITER, VALUE_DELIMITER, PARAM_VALUE_DELIMITER])
}

/// Quote where needed, or where the value was quoted when it was read.
fn quote_param_value(value: &str, was_quoted: bool) -> String {
    if was_quoted || needs_quotes(value) {
        format!("{PARAM_QUOTE}{value}{PARAM_QUOTE}")
    } else {
        value.to_owned()
    }
}

impl Emitter for ContentLine {
    fn generate(&self) -> String {
        let mut line = self.name.clone();
        for (key, values, spelling) in self.params.iter_spelled() {
            line.push(PARAM_DELIMITER);
            if let [value] = values
                && spelling.bare
                && !needs_quotes(value)
            {
                line.push_str(value);
                continue;
            }
            line.push_str(key);
            line.push(PARAM_NAME_DELIMITER);
            line.push_str(
                &values
                    .iter()
                    .enumerate()
                    .map(|(i, value)| quote_param_value(value, spelling.quoted.contains(&i)))
                    .join(&PARAM_VALUE_DELIMITER.to_string()),
            );
        }
        line.push(VALUE_DELIMITER);
        line.push_str(&self.value);
        fold_line(&line)
    }
}

/// Order of properties and subcomponents in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ordering {
    /// Arrival order.
    #[default]
    Preserve,
    /// Stable canonical order: each component's leading properties (`VERSION`,
    /// `UID`, ...) first, the rest by name, timezones before other subcomponents.
    Canonical,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub ordering: Ordering,
}

impl GeneratorOptions {
    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }
}

/// Serializes against a registry, like [`crate::ComponentParser`] parses against one.
#[derive(Clone, Copy)]
pub struct Generator<'r> {
    registry: &'r Registry,
    ordering: Ordering,
}

impl Default for Generator<'static> {
    fn default() -> Self {
        Self::new(global())
    }
}

impl<'r> Generator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            ordering: Ordering::default(),
        }
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.ordering = options.ordering;
        self
    }

    /// A single property as it would appear in a component of the given name.
    pub fn property(&self, prop: &Property, component: &str) -> String {
        encode_property(prop, &self.registry.shape(component), self.registry).generate()
    }

    pub fn component(&self, comp: &Component) -> String {
        let mut out = String::new();
        self.write_component(comp, &mut out);
        out
    }

    pub fn document(&self, doc: &Document) -> String {
        let mut out = String::new();
        for comp in &doc.components {
            self.write_component(comp, &mut out);
        }
        out
    }
}

impl Emitter for Property {
    /// Encoded against the process-wide registry, outside of any particular component.
    fn generate(&self) -> String {
        encode_property(self, &ComponentShape::generic(""), global()).generate()
    }
}

impl Emitter for Component {
    fn generate(&self) -> String {
        Generator::default().component(self)
    }
}

impl Emitter for Document {
    fn generate(&self) -> String {
        Generator::default().document(self)
    }
}
