//! Native representations of property values.

use base64::Engine;
use itertools::Itertools;
use std::fmt;

mod error;
pub use error::{ConstructionError, ValueDecodeError};
mod datetime;
pub use datetime::*;
mod duration;
pub use duration::*;
mod period;
pub use period::*;
mod recur;
pub use recur::*;
mod structured;
pub use structured::*;
mod timezone;
pub use timezone::*;
mod utc_offset;
pub use utc_offset::*;

use crate::escape::escape_text;

/// Value type tags as written in `VALUE=`.
pub mod tag {
    pub const TEXT: &str = "TEXT";
    pub const DATE: &str = "DATE";
    pub const DATE_TIME: &str = "DATE-TIME";
    pub const TIME: &str = "TIME";
    pub const DURATION: &str = "DURATION";
    pub const PERIOD: &str = "PERIOD";
    pub const RECUR: &str = "RECUR";
    pub const INTEGER: &str = "INTEGER";
    pub const FLOAT: &str = "FLOAT";
    pub const BOOLEAN: &str = "BOOLEAN";
    pub const BINARY: &str = "BINARY";
    pub const CAL_ADDRESS: &str = "CAL-ADDRESS";
    pub const URI: &str = "URI";
    pub const UTC_OFFSET: &str = "UTC-OFFSET";
    pub const ADDRESS: &str = "ADDRESS";
    pub const NAME: &str = "NAME";
    pub const ORGANIZATION: &str = "ORGANIZATION";
    pub const STRUCTURED: &str = "STRUCTURED";
    /// No codec applies, the raw text is kept.
    pub const UNKNOWN: &str = "UNKNOWN";

    pub const BUILTIN: &[&str] = &[
        TEXT,
        DATE,
        DATE_TIME,
        TIME,
        DURATION,
        PERIOD,
        RECUR,
        INTEGER,
        FLOAT,
        BOOLEAN,
        BINARY,
        CAL_ADDRESS,
        URI,
        UTC_OFFSET,
        ADDRESS,
        NAME,
        ORGANIZATION,
        STRUCTURED,
    ];

    pub fn is_builtin(tag: &str) -> bool {
        BUILTIN.iter().any(|builtin| builtin.eq_ignore_ascii_case(tag))
    }
}

/// Raw text that could not be decoded as the type it was expected to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenValue {
    pub property: String,
    /// The text exactly as it was read.
    pub raw: String,
    pub expected_type: String,
    pub error: ValueDecodeError,
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unescaped text.
    Text(String),
    Date(CalDate),
    DateTime(CalDateTime),
    Time(CalTime),
    Duration(chrono::Duration),
    Period(Period),
    Recur(RecurRule),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Binary(Vec<u8>),
    CalAddress(String),
    Uri(String),
    UtcOffset(UtcOffset),
    Address(Address),
    Name(Name),
    Organization(Organization),
    Structured(StructuredValue),
    /// Items of a multi-valued property (`CATEGORIES`, `EXDATE`, `GEO`, ...).
    List(Vec<Value>),
    /// Text of a property without a known type, as read.
    Unknown(String),
    Broken(BrokenValue),
}

macro_rules! value_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

value_from!(
    Date(CalDate),
    DateTime(CalDateTime),
    Time(CalTime),
    Duration(chrono::Duration),
    Period(Period),
    Recur(RecurRule),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    UtcOffset(UtcOffset),
    Address(Address),
    Name(Name),
    Organization(Organization),
    Structured(StructuredValue),
    List(Vec<Value>),
);

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<CalDateOrDateTime> for Value {
    fn from(value: CalDateOrDateTime) -> Self {
        match value {
            CalDateOrDateTime::Date(date) => Self::Date(date),
            CalDateOrDateTime::DateTime(datetime) => Self::DateTime(datetime),
        }
    }
}

impl Value {
    /// The `VALUE=` tag of this value. `None` for lists of mixed or no items and
    /// for values without a type.
    pub fn value_type(&self) -> Option<&'static str> {
        Some(match self {
            Self::Text(_) => tag::TEXT,
            Self::Date(_) => tag::DATE,
            Self::DateTime(_) => tag::DATE_TIME,
            Self::Time(_) => tag::TIME,
            Self::Duration(_) => tag::DURATION,
            Self::Period(_) => tag::PERIOD,
            Self::Recur(_) => tag::RECUR,
            Self::Integer(_) => tag::INTEGER,
            Self::Float(_) => tag::FLOAT,
            Self::Boolean(_) => tag::BOOLEAN,
            Self::Binary(_) => tag::BINARY,
            Self::CalAddress(_) => tag::CAL_ADDRESS,
            Self::Uri(_) => tag::URI,
            Self::UtcOffset(_) => tag::UTC_OFFSET,
            Self::Address(_) => tag::ADDRESS,
            Self::Name(_) => tag::NAME,
            Self::Organization(_) => tag::ORGANIZATION,
            Self::Structured(_) => tag::STRUCTURED,
            Self::List(items) => {
                return items
                    .iter()
                    .map(Value::value_type)
                    .all_equal_value()
                    .ok()
                    .flatten();
            }
            Self::Unknown(_) | Self::Broken(_) => return None,
        })
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Broken(_))
    }

    pub fn as_broken(&self) -> Option<&BrokenValue> {
        match self {
            Self::Broken(broken) => Some(broken),
            _ => None,
        }
    }

    /// The text of TEXT-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::CalAddress(text) | Self::Uri(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<&CalDateTime> {
        match self {
            Self::DateTime(datetime) => Some(datetime),
            _ => None,
        }
    }

    pub fn as_list(&self) -> &[Value] {
        match self {
            Self::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// `TZID` a date-time based value needs in its parameters.
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::DateTime(datetime) => datetime.tzid(),
            Self::Period(period) => period.tzid(),
            Self::List(items) => items.iter().find_map(Value::tzid),
            _ => None,
        }
    }

    /// A duration, or a period's duration, that text cannot represent.
    pub fn fractional_duration(&self) -> Option<chrono::Duration> {
        match self {
            Self::Duration(duration) if !is_whole_seconds(duration) => Some(*duration),
            Self::Period(Period {
                end: PeriodEnd::Duration(duration),
                ..
            }) if !is_whole_seconds(duration) => Some(*duration),
            Self::List(items) => items.iter().find_map(Value::fractional_duration),
            _ => None,
        }
    }

    /// Local time without any zone.
    pub fn is_floating(&self) -> bool {
        match self {
            Self::DateTime(datetime) => datetime.is_floating(),
            Self::Period(period) => period.start.is_floating(),
            Self::List(items) => items.iter().any(Value::is_floating),
            _ => false,
        }
    }
}

/// Content line form of the value. List items are joined with `,`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(&escape_text(text)),
            Self::Date(date) => f.write_str(&date.format()),
            Self::DateTime(datetime) => f.write_str(&datetime.format()),
            Self::Time(time) => f.write_str(&time.format()),
            Self::Duration(duration) => f.write_str(&format_duration(duration)),
            Self::Period(period) => f.write_str(&period.format()),
            Self::Recur(rule) => f.write_str(&rule.format()),
            Self::Integer(int) => write!(f, "{int}"),
            Self::Float(float) => write!(f, "{float}"),
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Binary(bytes) => {
                f.write_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            Self::CalAddress(text) | Self::Uri(text) | Self::Unknown(text) => f.write_str(text),
            Self::UtcOffset(offset) => f.write_str(&offset.format()),
            Self::Address(value) => f.write_str(&value.format()),
            Self::Name(value) => f.write_str(&value.format()),
            Self::Organization(value) => f.write_str(&value.format()),
            Self::Structured(value) => f.write_str(&value.format()),
            Self::List(items) => f.write_str(&items.iter().join(",")),
            Self::Broken(broken) => f.write_str(&broken.raw),
        }
    }
}
