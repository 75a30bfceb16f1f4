use crate::types::InvalidDuration;

/// A property's raw text does not match the value type it was decoded as.
///
/// Never fatal: the property is kept as a [`crate::types::BrokenValue`].
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValueDecodeError {
    #[error("invalid DATE: {0:?}")]
    InvalidDate(String),
    #[error("invalid DATE-TIME: {0:?}")]
    InvalidDateTime(String),
    #[error("invalid TIME: {0:?}")]
    InvalidTime(String),
    #[error(transparent)]
    InvalidDuration(#[from] InvalidDuration),
    #[error("invalid PERIOD {0:?}: {1}")]
    InvalidPeriod(String, &'static str),
    #[error("invalid RECUR: {0}")]
    InvalidRecur(String),
    #[error("invalid INTEGER: {0:?}")]
    InvalidInteger(String),
    #[error("invalid FLOAT: {0:?}")]
    InvalidFloat(String),
    #[error("invalid BOOLEAN: {0:?}")]
    InvalidBoolean(String),
    #[error("invalid BINARY: {0}")]
    InvalidBinary(String),
    #[error("invalid UTC-OFFSET: {0:?}")]
    InvalidUtcOffset(String),
    #[error("invalid structured value: {0}")]
    InvalidStructured(String),
}

/// Misuse of the programmatic construction API.
///
/// Distinct from [`ValueDecodeError`]: this is a caller bug, not malformed input.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("{property} takes {expected}, not {found}")]
    WrongValueType {
        property: String,
        expected: String,
        found: String,
    },
    #[error("broken values can only come from parsing")]
    BrokenValue,
    #[error("{kind} has {arity} fields, got {found}")]
    TooManyFields {
        kind: &'static str,
        arity: usize,
        found: usize,
    },
    #[error("invalid date {0}-{1}-{2}")]
    InvalidDate(i32, u32, u32),
    #[error("invalid time {0}:{1}:{2}")]
    InvalidTime(u32, u32, u32),
    #[error("period start and end disagree about their timezone")]
    InconsistentPeriod,
    #[error("invalid recurrence rule: {0}")]
    InvalidRecur(String),
    #[error("{0} cannot hold an empty list")]
    EmptyList(String),
    #[error("duration {0} has a fraction of a second")]
    FractionalSeconds(chrono::Duration),
}
