//! Properties and their declarations.
//!
//! [`PROPERTIES`] declares, per property name, the default value type, the types
//! a `VALUE=` parameter may switch to, the list separator of multi-valued
//! properties and the RFC default parameters. Component shapes may override
//! single entries (see [`crate::registry::ComponentShape`]).

use itertools::Itertools;
use std::borrow::Cow;

use crate::{
    escape::unescape_text,
    parser::ContentLineParams,
    types::{BrokenValue, ConstructionError, Value, tag},
};

mod recurid;
pub use recurid::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyType {
    pub default_type: &'static str,
    /// Types allowed besides the default one.
    pub allowed: &'static [&'static str],
    /// Multi-valued properties hold a list split on this character.
    pub separator: Option<char>,
    pub default_params: &'static [(&'static str, &'static str)],
}

impl PropertyType {
    pub const fn new(default_type: &'static str) -> Self {
        Self {
            default_type,
            allowed: &[],
            separator: None,
            default_params: &[],
        }
    }

    pub const fn allow(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = allowed;
        self
    }

    pub const fn list(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    pub const fn params(mut self, default_params: &'static [(&'static str, &'static str)]) -> Self {
        self.default_params = default_params;
        self
    }

    pub fn allows(&self, value_type: &str) -> bool {
        self.default_type.eq_ignore_ascii_case(value_type)
            || self
                .allowed
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(value_type))
    }

    pub fn default_param(&self, name: &str) -> Option<&'static str> {
        self.default_params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

const TEXT: PropertyType = PropertyType::new(tag::TEXT);
const TEXT_LIST: PropertyType = PropertyType::new(tag::TEXT).list(',');
const URI: PropertyType = PropertyType::new(tag::URI);
const INTEGER: PropertyType = PropertyType::new(tag::INTEGER);
const CAL_ADDRESS: PropertyType = PropertyType::new(tag::CAL_ADDRESS);
const UTC_OFFSET: PropertyType = PropertyType::new(tag::UTC_OFFSET);
const UTC_DATE_TIME: PropertyType = PropertyType::new(tag::DATE_TIME);
const DATE_OR_DATE_TIME: PropertyType = PropertyType::new(tag::DATE_TIME).allow(&[tag::DATE]);

pub static PROPERTIES: phf::Map<&'static str, PropertyType> = phf::phf_map! {
    // RFC 5545 calendar properties
    "CALSCALE" => TEXT,
    "METHOD" => TEXT,
    "PRODID" => TEXT,
    "VERSION" => TEXT,
    // descriptive
    "ATTACH" => URI.allow(&[tag::BINARY]),
    "CATEGORIES" => TEXT_LIST,
    "CLASS" => TEXT,
    "COMMENT" => TEXT,
    "DESCRIPTION" => TEXT,
    "GEO" => PropertyType::new(tag::FLOAT).list(';'),
    "LOCATION" => TEXT,
    "PERCENT-COMPLETE" => INTEGER,
    "PRIORITY" => INTEGER,
    "RESOURCES" => TEXT_LIST,
    "STATUS" => TEXT,
    "SUMMARY" => TEXT,
    // date and time
    "COMPLETED" => UTC_DATE_TIME,
    "DTEND" => DATE_OR_DATE_TIME,
    "DUE" => DATE_OR_DATE_TIME,
    "DTSTART" => DATE_OR_DATE_TIME,
    "DURATION" => PropertyType::new(tag::DURATION),
    "FREEBUSY" => PropertyType::new(tag::PERIOD).list(',').params(&[("FBTYPE", "BUSY")]),
    "TRANSP" => TEXT,
    // timezone
    "TZID" => TEXT,
    "TZNAME" => TEXT,
    "TZOFFSETFROM" => UTC_OFFSET,
    "TZOFFSETTO" => UTC_OFFSET,
    "TZURL" => URI,
    // relationship
    "ATTENDEE" => CAL_ADDRESS.params(&[
        ("CUTYPE", "INDIVIDUAL"),
        ("ROLE", "REQ-PARTICIPANT"),
        ("PARTSTAT", "NEEDS-ACTION"),
        ("RSVP", "FALSE"),
    ]),
    "CONTACT" => TEXT,
    "ORGANIZER" => CAL_ADDRESS,
    "RECURRENCE-ID" => DATE_OR_DATE_TIME,
    "RELATED-TO" => TEXT.params(&[("RELTYPE", "PARENT")]),
    "URL" => URI,
    "UID" => TEXT,
    // recurrence
    "EXDATE" => DATE_OR_DATE_TIME.list(','),
    "EXRULE" => PropertyType::new(tag::RECUR),
    "RDATE" => PropertyType::new(tag::DATE_TIME).allow(&[tag::DATE, tag::PERIOD]).list(','),
    "RRULE" => PropertyType::new(tag::RECUR),
    // alarm
    "ACTION" => TEXT,
    "REPEAT" => INTEGER,
    "TRIGGER" => PropertyType::new(tag::DURATION)
        .allow(&[tag::DATE_TIME])
        .params(&[("RELATED", "START")]),
    // change management
    "CREATED" => UTC_DATE_TIME,
    "DTSTAMP" => UTC_DATE_TIME,
    "LAST-MODIFIED" => UTC_DATE_TIME,
    "SEQUENCE" => INTEGER,
    // miscellaneous
    "REQUEST-STATUS" => PropertyType::new(tag::STRUCTURED),
    // RFC 7986
    "NAME" => TEXT,
    "REFRESH-INTERVAL" => PropertyType::new(tag::DURATION),
    "SOURCE" => URI,
    "COLOR" => TEXT,
    "IMAGE" => URI.allow(&[tag::BINARY]),
    "CONFERENCE" => URI,
    // RFC 7953
    "BUSYTYPE" => TEXT,
    // RFC 6350 vCard
    "FN" => TEXT,
    "N" => PropertyType::new(tag::NAME),
    "NICKNAME" => TEXT_LIST,
    "ADR" => PropertyType::new(tag::ADDRESS),
    "ORG" => PropertyType::new(tag::ORGANIZATION),
    "EMAIL" => TEXT,
    "TITLE" => TEXT,
    "ROLE" => TEXT,
    "NOTE" => TEXT,
    "PHOTO" => URI.allow(&[tag::BINARY]),
    "LOGO" => URI.allow(&[tag::BINARY]),
    "SOUND" => URI.allow(&[tag::BINARY]),
    "KEY" => URI.allow(&[tag::TEXT, tag::BINARY]),
    "REV" => UTC_DATE_TIME,
    "GENDER" => PropertyType::new(tag::STRUCTURED),
    "KIND" => TEXT,
};

/// Look a property up in [`PROPERTIES`], ignoring case and any vCard group prefix.
pub fn property_type(name: &str) -> Option<PropertyType> {
    let name = name.rsplit_once('.').map_or(name, |(_, name)| name);
    PROPERTIES.get(name.to_ascii_uppercase().as_str()).copied()
}

/// A decoded property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Name as read, group prefix included.
    pub name: String,
    pub params: ContentLineParams,
    /// Tag of the codec that produced (and will encode) `value`.
    pub value_type: String,
    pub value: Value,
}

impl Property {
    /// A property with a TEXT value.
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ContentLineParams::default(),
            value_type: tag::TEXT.to_owned(),
            value: Value::Text(text.into()),
        }
    }

    /// A property with a value of any type the property accepts.
    pub fn try_new(name: impl Into<String>, value: impl Into<Value>) -> Result<Self, ConstructionError> {
        let mut prop = Self {
            name: name.into(),
            params: ContentLineParams::default(),
            value_type: tag::UNKNOWN.to_owned(),
            value: Value::Unknown(String::new()),
        };
        prop.set_value(value)?;
        Ok(prop)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.replace_param(name.into(), value.into());
        self
    }

    /// Replace the value, checking it against the property's declaration.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<(), ConstructionError> {
        let value = value.into();
        if value.is_broken() {
            return Err(ConstructionError::BrokenValue);
        }
        if let Value::List(items) = &value {
            if items.is_empty() {
                return Err(ConstructionError::EmptyList(self.name.clone()));
            }
            // without a separator the items cannot be told apart on reading
            if self.property_type().and_then(|declared| declared.separator).is_none() {
                return Err(ConstructionError::WrongValueType {
                    property: self.name.clone(),
                    expected: "a single value".to_owned(),
                    found: "a list".to_owned(),
                });
            }
        }
        if let Some(duration) = value.fractional_duration() {
            return Err(ConstructionError::FractionalSeconds(duration));
        }
        let value_type = match (&value, value.value_type()) {
            (Value::Unknown(_), _) => tag::UNKNOWN,
            (_, Some(value_type)) => value_type,
            (_, None) => {
                return Err(ConstructionError::WrongValueType {
                    property: self.name.clone(),
                    expected: "a single type".to_owned(),
                    found: "a mixed list".to_owned(),
                });
            }
        };
        if let Some(declared) = self.property_type()
            && value_type != tag::UNKNOWN
            && !declared.allows(value_type)
        {
            return Err(ConstructionError::WrongValueType {
                property: self.name.clone(),
                expected: std::iter::once(declared.default_type)
                    .chain(declared.allowed.iter().copied())
                    .join(", "),
                found: value_type.to_owned(),
            });
        }
        self.value_type = value_type.to_owned();
        self.value = value;
        Ok(())
    }

    #[inline]
    pub fn property_type(&self) -> Option<PropertyType> {
        property_type(&self.name)
    }

    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.base_name().eq_ignore_ascii_case(name)
    }

    pub fn group(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(group, _)| group)
    }

    pub fn base_name(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(_, name)| name)
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        self.value.is_broken()
    }

    #[inline]
    pub fn broken(&self) -> Option<&BrokenValue> {
        self.value.as_broken()
    }

    /// Text of TEXT-like values. Untyped values are unescaped on the fly.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match &self.value {
            Value::Unknown(raw) => Some(Cow::Owned(unescape_text(raw))),
            value => value.as_str().map(Cow::Borrowed),
        }
    }

    /// A parameter, or the default the RFC defines for it when absent.
    pub fn param_or_default(&self, name: &str) -> Option<&str> {
        self.params.get_param(name).or_else(|| {
            self.property_type()
                .and_then(|declared| declared.default_param(name))
        })
    }
}
