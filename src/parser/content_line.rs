//! Parse the result of `LineReader` into parts.
//!
//! Split each unfolded line into a content line. A content line contains:
//! - A name, with its original casing (compared case-insensitively).
//! - An ordered list of parameters, each a key with one or more values. Quoted
//!   values lose their quotes, unquoted values are split on commas.
//! - The raw value, untouched: escaping is the value codec's business.
//!
//! It works for both the vCard and iCalendar format.
//!
//! # Examples
//!
//! ```rust
//! let input = b"ATTENDEE;CN=\"Doe, Jane\";ROLE=CHAIR:mailto:jane@example.com\r\n";
//! let line = calcodec::ContentLineParser::from_slice(input)
//!     .next()
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(line.name, "ATTENDEE");
//! assert_eq!(line.params.get_param("cn"), Some("Doe, Jane"));
//! assert_eq!(line.value, "mailto:jane@example.com");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Iterator;

use super::{BytesLines, Line, LineError, LineReader};
use crate::{PARAM_DELIMITER, PARAM_NAME_DELIMITER, PARAM_QUOTE, PARAM_VALUE_DELIMITER, VALUE_DELIMITER};

/// Error arising when trying to tokenize a content line
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ContentLineError {
    #[error("Line {0}: Missing property name.")]
    MissingName(usize),
    #[error("Line {0}: Invalid character {1:?} in property name.")]
    InvalidName(usize, char),
    #[error("Line {0}: Missing a closing quote.")]
    MissingClosingQuote(usize),
    #[error("Line {0}: Missing a \"{1}\" delimiter.")]
    MissingDelimiter(usize, char),
    #[error("Line {0}: Missing a parameter key.")]
    MissingParamKey(usize),
    #[error(transparent)]
    LineError(#[from] LineError),
}

impl ContentLineError {
    pub fn line(&self) -> usize {
        match self {
            Self::MissingName(line)
            | Self::InvalidName(line, _)
            | Self::MissingClosingQuote(line)
            | Self::MissingDelimiter(line, _)
            | Self::MissingParamKey(line)
            | Self::LineError(LineError::InvalidUtf8(line)) => *line,
        }
    }
}

/// The lexer's error type: one content line could not be tokenized.
pub type LexError = ContentLineError;

/// How a parameter was written, so that it is written the same way again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Spelling {
    /// vCard 2.1 bare parameter (`TEL;WORK`), read as `TYPE=WORK`.
    pub(crate) bare: bool,
    /// Positions of the values that were in double quotes.
    pub(crate) quoted: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Param {
    name: String,
    values: Vec<String>,
    spelling: Spelling,
}

impl Param {
    fn new(name: String, values: Vec<String>) -> Self {
        Self {
            name,
            values,
            spelling: Spelling::default(),
        }
    }
}

// Spelling is presentation only
impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.values == other.values
    }
}

impl Eq for Param {}

impl Hash for Param {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.values.hash(state);
    }
}

/// Ordered parameter multimap. Keys keep their casing and compare case-insensitively.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct ContentLineParams(Vec<Param>);

impl From<Vec<(String, Vec<String>)>> for ContentLineParams {
    fn from(params: Vec<(String, Vec<String>)>) -> Self {
        Self(
            params
                .into_iter()
                .map(|(name, values)| Param::new(name, values))
                .collect(),
        )
    }
}

impl ContentLineParams {
    #[inline]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.get_values(name)
            .and_then(|values| values.iter().map(String::as_ref).next())
    }

    #[inline]
    pub fn get_values(&self, name: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|param| param.name.eq_ignore_ascii_case(name))
            .map(|param| param.values.as_slice())
    }

    #[inline]
    pub fn has_param(&self, name: &str) -> bool {
        self.get_values(name).is_some()
    }

    #[inline]
    pub fn get_tzid(&self) -> Option<&str> {
        self.get_param("TZID")
    }

    #[inline]
    pub fn get_value_type(&self) -> Option<&str> {
        self.get_param("VALUE")
    }

    /// Replace the values of `name` in place, or append it.
    pub fn replace_param(&mut self, name: String, value: String) {
        match self.0.iter_mut().find(|param| param.name.eq_ignore_ascii_case(&name)) {
            Some(param) => {
                param.values = vec![value];
                param.spelling = Spelling::default();
            }
            None => self.0.push(Param::new(name, vec![value])),
        }
    }

    #[inline]
    pub fn push(&mut self, name: String, values: Vec<String>) {
        self.0.push(Param::new(name, values));
    }

    #[inline]
    pub fn remove(&mut self, name: &str) {
        self.0.retain(|param| !param.name.eq_ignore_ascii_case(name));
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|param| (param.name.as_str(), param.values.as_slice()))
    }

    pub(crate) fn iter_spelled(&self) -> impl Iterator<Item = (&str, &[String], &Spelling)> {
        self.0
            .iter()
            .map(|param| (param.name.as_str(), param.values.as_slice(), &param.spelling))
    }
}

/// A VCARD/ICAL content line.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct ContentLine {
    /// Property name, possibly with a vCard group prefix (`item1.TEL`).
    pub name: String,
    /// Property list of parameters.
    pub params: ContentLineParams,
    /// Raw property value.
    pub value: String,
}

impl ContentLine {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ContentLineParams::default(),
            value: value.into(),
        }
    }

    /// vCard group prefix, if any.
    pub fn group(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(group, _)| group)
    }

    /// Name without the group prefix.
    pub fn base_name(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(_, name)| name)
    }

    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for ContentLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "name: {}\nparams: {:?}\nvalue: {:?}",
            self.name, self.params, self.value
        )
    }
}

#[inline]
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')
}

pub struct ContentLineParser<'a, T: Iterator<Item = Cow<'a, [u8]>>>(LineReader<'a, T>);

impl<'a> ContentLineParser<'a, BytesLines<'a>> {
    pub fn from_slice(slice: &'a [u8]) -> Self {
        ContentLineParser(LineReader::from_slice(slice))
    }
}

impl<'a, T: Iterator<Item = Cow<'a, [u8]>>> ContentLineParser<'a, T> {
    pub fn new(line_reader: LineReader<'a, T>) -> Self {
        ContentLineParser(line_reader)
    }

    /// Tokenize one unfolded line.
    pub fn parse(line: &Line) -> Result<ContentLine, ContentLineError> {
        let number = line.number();
        let mut to_parse = line.as_str();

        // Find end of property name
        let Some(name_end) = to_parse.find([PARAM_DELIMITER, VALUE_DELIMITER]) else {
            return Err(ContentLineError::MissingDelimiter(number, VALUE_DELIMITER));
        };
        let (prop_name, remainder) = to_parse.split_at(name_end);
        if prop_name.is_empty() {
            return Err(ContentLineError::MissingName(number));
        }
        if let Some(c) = prop_name.chars().find(|c| !is_name_char(*c)) {
            return Err(ContentLineError::InvalidName(number, c));
        }
        to_parse = remainder;

        // remainder either starts with ; or :
        let mut params = vec![];
        while let Some(rest) = to_parse.strip_prefix(PARAM_DELIMITER) {
            to_parse = rest;

            let Some(key_end) =
                to_parse.find([PARAM_NAME_DELIMITER, PARAM_DELIMITER, VALUE_DELIMITER])
            else {
                return Err(ContentLineError::MissingDelimiter(number, VALUE_DELIMITER));
            };
            let (key, remainder) = to_parse.split_at(key_end);
            if key.is_empty() {
                return Err(ContentLineError::MissingParamKey(number));
            }
            let Some(remainder) = remainder.strip_prefix(PARAM_NAME_DELIMITER) else {
                // vCard 2.1 style bare parameter (TEL;WORK;VOICE:...)
                params.push(Param {
                    name: "TYPE".to_owned(),
                    values: vec![key.to_owned()],
                    spelling: Spelling {
                        bare: true,
                        quoted: vec![],
                    },
                });
                to_parse = remainder;
                continue;
            };
            to_parse = remainder;

            // In almost all cases we'll have one parameter value
            let mut values = Vec::with_capacity(1);
            let mut quoted_at = vec![];

            // Loop over comma-separated parameter values
            loop {
                if let Some(quoted) = to_parse.strip_prefix(PARAM_QUOTE) {
                    // This is a dquoted value. (NAME;Foo="Bar:Baz":value)
                    let Some((content, remainder)) = quoted.split_once(PARAM_QUOTE) else {
                        return Err(ContentLineError::MissingClosingQuote(number));
                    };
                    let mut value = content.to_owned();
                    // Tolerate junk between the closing quote and the next delimiter
                    let junk_end = remainder
                        .find([PARAM_DELIMITER, VALUE_DELIMITER, PARAM_VALUE_DELIMITER])
                        .unwrap_or(remainder.len());
                    value.push_str(&remainder[..junk_end]);
                    quoted_at.push(values.len());
                    values.push(value);
                    to_parse = &remainder[junk_end..];
                } else {
                    // This is a 'raw' value. (NAME;Foo=Bar:value)
                    // An '=' inside it is content, only ; : and , end it.
                    let Some(delim_pos) =
                        to_parse.find([PARAM_DELIMITER, VALUE_DELIMITER, PARAM_VALUE_DELIMITER])
                    else {
                        return Err(ContentLineError::MissingDelimiter(number, VALUE_DELIMITER));
                    };
                    let (content, remainder) = to_parse.split_at(delim_pos);
                    values.push(content.to_owned());
                    to_parse = remainder;
                }

                match to_parse.strip_prefix(PARAM_VALUE_DELIMITER) {
                    Some(rest) => to_parse = rest,
                    None => break,
                }
            }

            params.push(Param {
                name: key.to_owned(),
                values,
                spelling: Spelling {
                    bare: false,
                    quoted: quoted_at,
                },
            });
        }

        // Parse value
        let Some(value) = to_parse.strip_prefix(VALUE_DELIMITER) else {
            return Err(ContentLineError::MissingDelimiter(number, VALUE_DELIMITER));
        };
        Ok(ContentLine {
            name: prop_name.to_owned(),
            params: ContentLineParams(params),
            value: value.to_owned(),
        })
    }
}

impl<'a, T: Iterator<Item = Cow<'a, [u8]>>> Iterator for ContentLineParser<'a, T> {
    type Item = Result<ContentLine, ContentLineError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.0.next() {
            Some(Ok(line)) => Some(Self::parse(&line)),
            Some(Err(err)) => Some(Err(err.into())),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(input: &str) -> Result<ContentLine, ContentLineError> {
        ContentLineParser::from_slice(input.as_bytes())
            .next()
            .unwrap()
    }

    #[test]
    fn simple_line() {
        let line = parse("SUMMARY:Team Meeting").unwrap();
        assert_eq!(line.name, "SUMMARY");
        assert!(line.params.is_empty());
        assert_eq!(line.value, "Team Meeting");
    }

    #[test]
    fn keeps_casing_but_compares_without_it() {
        let line = parse("dtStart;tzid=Europe/Berlin:20240101T100000").unwrap();
        assert_eq!(line.name, "dtStart");
        assert!(line.is_named("DTSTART"));
        assert_eq!(line.params.get_tzid(), Some("Europe/Berlin"));
        assert_eq!(line.params.iter().next().unwrap().0, "tzid");
    }

    #[test]
    fn quoted_values_may_contain_delimiters() {
        let line = parse("ATTENDEE;CN=\"Doe; Jane: x,y\";X-A=1:mailto:j@example.com").unwrap();
        assert_eq!(line.params.get_param("CN"), Some("Doe; Jane: x,y"));
        assert_eq!(line.params.get_param("X-A"), Some("1"));
        assert_eq!(line.value, "mailto:j@example.com");
    }

    #[test]
    fn multi_valued_params() {
        let line =
            parse("ATTENDEE;DELEGATED-FROM=\"mailto:a@x\",\"mailto:b@x\";ROLE=A,B:mailto:c@x")
                .unwrap();
        assert_eq!(
            line.params.get_values("delegated-from").unwrap(),
            ["mailto:a@x", "mailto:b@x"]
        );
        assert_eq!(line.params.get_values("ROLE").unwrap(), ["A", "B"]);
        let spellings: Vec<_> = line
            .params
            .iter_spelled()
            .map(|(_, _, spelling)| spelling.quoted.clone())
            .collect();
        assert_eq!(spellings, [vec![0, 1], vec![]]);
    }

    #[test]
    fn equals_sign_inside_param_value() {
        let line = parse("PHOTO;X-DATA=aGVsbG8=;ENCODING=b:aGk=").unwrap();
        assert_eq!(line.params.get_param("X-DATA"), Some("aGVsbG8="));
        assert_eq!(line.params.get_param("ENCODING"), Some("b"));
        assert_eq!(line.value, "aGk=");
    }

    #[test]
    fn value_keeps_colons_and_semicolons() {
        let line = parse("URL:http://example.com/a;b?c=d:e").unwrap();
        assert_eq!(line.value, "http://example.com/a;b?c=d:e");
        let line = parse("X-EMPTY:").unwrap();
        assert_eq!(line.value, "");
    }

    #[test]
    fn grouped_names() {
        let line = parse("item1.TEL;TYPE=cell:+1 555").unwrap();
        assert_eq!(line.group(), Some("item1"));
        assert_eq!(line.base_name(), "TEL");
    }

    #[test]
    fn bare_params_become_types() {
        let line = parse("TEL;WORK;VOICE:+1 555").unwrap();
        assert_eq!(
            line.params,
            ContentLineParams::from(vec![
                ("TYPE".to_owned(), vec!["WORK".to_owned()]),
                ("TYPE".to_owned(), vec!["VOICE".to_owned()]),
            ])
        );
        assert!(line.params.iter_spelled().all(|(_, _, spelling)| spelling.bare));
    }

    #[rstest]
    #[case("NOCOLON", ContentLineError::MissingDelimiter(1, ':'))]
    #[case(":value", ContentLineError::MissingName(1))]
    #[case(";A=b:value", ContentLineError::MissingName(1))]
    #[case("X;=b:value", ContentLineError::MissingParamKey(1))]
    #[case("X;A=\"open:value", ContentLineError::MissingClosingQuote(1))]
    #[case("X;A=b", ContentLineError::MissingDelimiter(1, ':'))]
    #[case("BAD NAME:value", ContentLineError::InvalidName(1, ' '))]
    fn errors(#[case] input: &str, #[case] expected: ContentLineError) {
        assert_eq!(parse(input), Err(expected));
    }

    #[test]
    fn error_message() {
        insta::assert_snapshot!(parse("NOCOLON").unwrap_err(), @r#"Line 1: Missing a ":" delimiter."#);
    }

    #[test]
    fn lex_errors_are_per_line() {
        let input = "A:1\r\nBROKEN\r\nB:2\r\n";
        let results: Vec<_> = ContentLineParser::from_slice(input.as_bytes()).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().line(), 2);
        assert_eq!(results[2].as_ref().unwrap().value, "2");
    }
}
