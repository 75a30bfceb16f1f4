//! Value codecs: bidirectional conversion between a property's raw text and a [`Value`].
//!
//! A codec is registered under the value type tag it handles (`DATE-TIME`,
//! `RECUR`, ...) in a [`crate::registry::Registry`]. Which tag applies to a given
//! line is decided by [`crate::parser::resolve_value_type`].

use crate::{
    parser::ContentLineParams,
    types::{TzResolver, Value, ValueDecodeError},
};

mod builtin;
pub use builtin::*;

/// What a codec gets to see besides the raw text.
pub struct DecodeContext<'a> {
    /// Name of the property being decoded.
    pub property: &'a str,
    pub params: &'a ContentLineParams,
    pub resolver: &'a dyn TzResolver,
}

impl DecodeContext<'_> {
    #[inline]
    pub fn tzid(&self) -> Option<&str> {
        self.params.get_tzid()
    }
}

pub trait ValueCodec: Send + Sync {
    /// Decode one value. List properties call this once per item.
    fn decode(&self, raw: &str, ctx: &DecodeContext) -> Result<Value, ValueDecodeError>;

    /// Encode one value, adjusting `params` (`TZID`, `ENCODING`) where the value needs it.
    fn encode(&self, value: &Value, _params: &mut ContentLineParams) -> String {
        value.to_string()
    }
}
