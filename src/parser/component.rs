use std::{borrow::Cow, sync::Arc};

use crate::{
    ContentLineParser, LineReader, ParserError,
    component::Component,
    parser::{
        BytesLines, ContentLineError, Diagnostic, LexErrorPolicy, Line, ParserOptions,
        StructuralError, decode_property,
    },
    registry::{ComponentShape, Registry, global},
    types::TzResolver,
};

/// Every top-level component of an input plus what went wrong outside of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub components: Vec<Component>,
    /// Diagnostics that belong to no component (orphan properties, stray `END`s).
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Whether nothing at all went wrong while parsing.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && !self.components.iter().any(Component::has_errors)
    }
}

/// Builds component trees from content lines.
///
/// Yields one tree per top-level `BEGIN`/`END` block. Malformed input never
/// stops it: broken values, unbalanced `END`s and (by default) untokenizable
/// lines end up as [`Diagnostic`]s on the component they occurred in, or in
/// [`ComponentParser::diagnostics`] when no component was open.
pub struct ComponentParser<'a, 'r, I: Iterator<Item = Cow<'a, [u8]>>> {
    lines: LineReader<'a, I>,
    registry: &'r Registry,
    resolver: Arc<dyn TzResolver>,
    options: ParserOptions,
    diagnostics: Vec<Diagnostic>,
    done: bool,
}

impl<'a> ComponentParser<'a, 'static, BytesLines<'a>> {
    /// Parse `slice` against the process-wide registry.
    pub fn from_slice(slice: &'a [u8]) -> Self {
        Self::new(LineReader::from_slice(slice), global())
    }
}

impl<'a, 'r, I: Iterator<Item = Cow<'a, [u8]>>> ComponentParser<'a, 'r, I> {
    pub fn new(lines: LineReader<'a, I>, registry: &'r Registry) -> Self {
        Self {
            lines,
            registry,
            resolver: registry.resolver(),
            options: ParserOptions::default(),
            diagnostics: vec![],
            done: false,
        }
    }

    /// Decode against `registry` instead.
    pub fn with_registry<'s>(self, registry: &'s Registry) -> ComponentParser<'a, 's, I> {
        ComponentParser {
            lines: self.lines,
            registry,
            resolver: registry.resolver(),
            options: self.options,
            diagnostics: self.diagnostics,
            done: self.done,
        }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Diagnostics recorded outside of any component so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn expect_one(mut self) -> Result<Component, ParserError> {
        let item = self.next().ok_or(ParserError::EmptyInput)??;
        if self.next().is_some() {
            return Err(ParserError::TooManyComponents);
        }
        Ok(item)
    }

    /// Run to the end of the input.
    pub fn into_document(mut self) -> Result<Document, ParserError> {
        let components = self.by_ref().collect::<Result<Vec<_>, _>>()?;
        Ok(Document {
            components,
            diagnostics: self.diagnostics,
        })
    }

    fn record(&mut self, stack: &mut [Frame], diagnostic: Diagnostic) {
        match stack.last_mut() {
            Some(frame) => frame.component.errors.push(diagnostic),
            None => self.diagnostics.push(diagnostic),
        }
    }

    /// Handle a line that could not be read or tokenized. `Err` means abort.
    fn lex_error(&mut self, stack: &mut [Frame], err: ContentLineError) -> Result<(), ParserError> {
        match self.options.lex_errors {
            LexErrorPolicy::Record => {
                tracing::warn!(%err, "recording untokenizable line");
                self.record(stack, Diagnostic::lex(err));
                Ok(())
            }
            LexErrorPolicy::Skip => {
                tracing::trace!(%err, "skipping untokenizable line");
                Ok(())
            }
            LexErrorPolicy::Abort => Err(err.into()),
        }
    }

    /// Feed one line to the stack machine. Returns the outermost component once it is sealed.
    fn handle(&mut self, stack: &mut Vec<Frame>, line: &Line) -> Result<Option<Component>, ParserError> {
        let number = line.number();
        let content_line = match ContentLineParser::<I>::parse(line) {
            Ok(content_line) => content_line,
            Err(err) => {
                self.lex_error(stack, err)?;
                return Ok(None);
            }
        };

        if content_line.is_named("BEGIN") {
            let name = content_line.value.trim();
            if name.is_empty() {
                tracing::warn!(line = number, "ignoring BEGIN without a name");
                self.record(
                    stack,
                    Diagnostic::structure(Some(number), StructuralError::MissingComponentName),
                );
                return Ok(None);
            }
            stack.push(Frame {
                component: Component::new(name),
                shape: self.registry.shape(name),
            });
            return Ok(None);
        }

        if content_line.is_named("END") {
            let name = content_line.value.trim();
            let Some(index) = stack
                .iter()
                .rposition(|frame| frame.component.is_named(name))
            else {
                let err = match stack.last() {
                    None => StructuralError::UnmatchedEnd(name.to_owned()),
                    Some(frame) => StructuralError::MismatchedEnd {
                        expected: frame.component.name.clone(),
                        found: name.to_owned(),
                    },
                };
                tracing::warn!(line = number, %err, "ignoring END line");
                self.record(stack, Diagnostic::structure(Some(number), err));
                return Ok(None);
            };
            // anything opened after the matching BEGIN is missing its END
            while stack.len() > index + 1 {
                close(stack, Some(number));
            }
            return Ok(seal(stack));
        }

        let Some(frame) = stack.last_mut() else {
            tracing::warn!(line = number, property = %content_line.name, "ignoring property outside of any component");
            self.diagnostics.push(Diagnostic {
                line: Some(number),
                property: Some(content_line.name.clone()),
                kind: StructuralError::OrphanProperty(content_line.name).into(),
            });
            return Ok(None);
        };
        let property = decode_property(content_line, &frame.shape, self.registry, &*self.resolver);
        if let Some(broken) = property.broken() {
            frame.component.errors.push(Diagnostic::value(
                property.name.clone(),
                number,
                broken.error.clone(),
            ));
        }
        frame.component.add_property(property);
        Ok(None)
    }
}

struct Frame {
    component: Component,
    shape: Arc<ComponentShape>,
}

/// Pop the innermost component into its parent. Returns it when it was the outermost one.
fn seal(stack: &mut Vec<Frame>) -> Option<Component> {
    let frame = stack.pop()?;
    match stack.last_mut() {
        Some(parent) => {
            parent.component.add_component(frame.component);
            None
        }
        None => Some(frame.component),
    }
}

/// [`seal`] the innermost component although its `END` is missing.
fn close(stack: &mut Vec<Frame>, line: Option<usize>) -> Option<Component> {
    let frame = stack.last_mut()?;
    tracing::warn!(component = %frame.component.name, "closing component without END");
    let name = frame.component.name.clone();
    frame
        .component
        .errors
        .push(Diagnostic::structure(line, StructuralError::MissingEnd(name)));
    seal(stack)
}

impl<'a, I: Iterator<Item = Cow<'a, [u8]>>> Iterator for ComponentParser<'a, '_, I> {
    type Item = Result<Component, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut stack: Vec<Frame> = vec![];
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    if let Err(err) = self.lex_error(&mut stack, err.into()) {
                        self.done = true;
                        return Some(Err(err));
                    }
                    continue;
                }
                None => {
                    self.done = true;
                    while !stack.is_empty() {
                        if let Some(root) = close(&mut stack, None) {
                            return Some(Ok(root));
                        }
                    }
                    return None;
                }
            };
            match self.handle(&mut stack, &line) {
                Ok(Some(component)) => return Some(Ok(component)),
                Ok(None) => {}
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Parse every top-level component of `input`.
///
/// Never fails: with the default options every problem is reported as a
/// [`Diagnostic`] in the returned tree.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse_document(input: &[u8]) -> Document {
    let mut parser = ComponentParser::from_slice(input);
    let components = parser.by_ref().filter_map(Result::ok).collect();
    Document {
        components,
        diagnostics: parser.diagnostics,
    }
}

/// Parse an input holding exactly one top-level component.
///
/// Diagnostics raised outside of any component, like a stray `END`, are not
/// part of the result. Input without a component is [`ParserError::EmptyInput`]
/// even when such diagnostics exist; use [`parse_document`] to see them.
pub fn parse(input: &[u8]) -> Result<Component, ParserError> {
    ComponentParser::from_slice(input).expect_one()
}
