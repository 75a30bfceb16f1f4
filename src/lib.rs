//! Lossless codec between iCalendar/vCard text and a typed component tree.
//!
//! ```rust
//! use calcodec::{Emitter, Value};
//!
//! let input = "BEGIN:VEVENT\r\nDTSTART:NOT-A-DATE\r\nSUMMARY:Hello\r\nEND:VEVENT\r\n";
//! let event = calcodec::parse(input.as_bytes()).unwrap();
//!
//! assert!(event.get_property("DTSTART").unwrap().is_broken());
//! assert_eq!(event.get_property("SUMMARY").unwrap().value, Value::Text("Hello".to_owned()));
//! assert_eq!(event.errors.len(), 1);
//! assert_eq!(event.generate(), input);
//! ```

const PARAM_VALUE_DELIMITER: char = ',';
const VALUE_DELIMITER: char = ':';
const PARAM_DELIMITER: char = ';';
const PARAM_NAME_DELIMITER: char = '=';
const PARAM_QUOTE: char = '"';

pub mod escape;

pub mod parser;
pub use parser::{
    ComponentParser, ContentLine, ContentLineParams, ContentLineParser, Diagnostic, Document,
    LexErrorPolicy, LineReader, ParserError, ParserOptions, parse, parse_document,
};

pub mod codec;

pub mod types;
pub use types::Value;

pub mod property;
pub use property::Property;

pub mod component;
pub use component::Component;

pub mod registry;
pub use registry::Registry;

pub mod generator;
pub use generator::{Emitter, Generator, GeneratorOptions};
