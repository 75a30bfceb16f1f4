//! Structured values: `;`-separated fields, each a `,`-separated list of TEXT items.
//!
//! Used by vCard `N`, `ADR` and `ORG` and by iCalendar `REQUEST-STATUS`.
//! Splitting honours backslash escapes, so `\;` and `\,` stay inside their field.

use derive_more::{Deref, From};
use itertools::Itertools;

use crate::escape::{escape_text, split_on_unescaped_comma, split_on_unescaped_semicolon, unescape_text};
use crate::types::ConstructionError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StructuredValue {
    /// An empty field is `[""]`, never `[]`.
    fields: Vec<Vec<String>>,
}

impl StructuredValue {
    pub fn new(fields: Vec<Vec<String>>) -> Self {
        let fields = fields
            .into_iter()
            .map(|field| if field.is_empty() { vec![String::new()] } else { field })
            .collect();
        Self { fields }
    }

    pub fn parse(value: &str) -> Self {
        let fields = split_on_unescaped_semicolon(value)
            .into_iter()
            .map(|field| {
                split_on_unescaped_comma(field)
                    .into_iter()
                    .map(unescape_text)
                    .collect()
            })
            .collect();
        Self { fields }
    }

    pub fn format(&self) -> String {
        self.fields
            .iter()
            .map(|field| field.iter().map(|item| escape_text(item)).join(","))
            .join(";")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Items of field `index`; a missing field reads as empty.
    pub fn field(&self, index: usize) -> &[String] {
        self.fields.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Field `index` with its items joined by `,`.
    pub fn text(&self, index: usize) -> String {
        self.field(index).join(",")
    }

    pub fn fields(&self) -> &[Vec<String>] {
        &self.fields
    }
}

macro_rules! structured {
    ($(#[$meta:meta])* $name:ident, $kind:literal, [$($index:literal => $field:ident),* $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, From, Deref)]
        pub struct $name(pub StructuredValue);

        impl $name {
            pub const ARITY: usize = [$($index),*].len();

            /// Build from positional fields. Missing trailing fields are empty.
            pub fn from_fields(fields: Vec<Vec<String>>) -> Result<Self, ConstructionError> {
                if fields.len() > Self::ARITY {
                    return Err(ConstructionError::TooManyFields {
                        kind: $kind,
                        arity: Self::ARITY,
                        found: fields.len(),
                    });
                }
                Ok(Self(StructuredValue::new(fields)))
            }

            $(
                pub fn $field(&self) -> String {
                    self.0.text($index)
                }
            )*
        }
    };
}

structured!(
    /// vCard `ADR`.
    Address,
    "ADDRESS",
    [
        0 => po_box,
        1 => extended,
        2 => street,
        3 => locality,
        4 => region,
        5 => postal_code,
        6 => country,
    ]
);

structured!(
    /// vCard `N`.
    Name,
    "NAME",
    [
        0 => family,
        1 => given,
        2 => additional,
        3 => prefix,
        4 => suffix,
    ]
);

structured!(
    /// vCard `ORG`: the organization followed by any number of units.
    Organization,
    "ORGANIZATION",
    [0 => name]
);

impl Organization {
    pub fn units(&self) -> Vec<String> {
        (1..self.0.len()).map(|i| self.0.text(i)).collect()
    }

    pub fn with_units(name: impl Into<String>, units: impl IntoIterator<Item = String>) -> Self {
        let fields = std::iter::once(vec![name.into()])
            .chain(units.into_iter().map(|unit| vec![unit]))
            .collect();
        Self(StructuredValue::new(fields))
    }
}
