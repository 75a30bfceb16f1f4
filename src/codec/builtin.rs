use base64::Engine;
use std::sync::Arc;

use crate::{
    codec::{DecodeContext, ValueCodec},
    escape::unescape_text,
    parser::ContentLineParams,
    types::{
        Address, CalDateOrDateTime, CalTime, Name, Organization, Period, RecurRule,
        StructuredValue, UtcOffset, Value, ValueDecodeError, parse_duration, tag,
    },
};

macro_rules! codec {
    ($(#[$meta:meta])* $name:ident, |$raw:ident, $ctx:pat_param| $decode:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl ValueCodec for $name {
            fn decode(&self, $raw: &str, $ctx: &DecodeContext) -> Result<Value, ValueDecodeError> {
                $decode
            }
        }
    };
}

codec!(TextCodec, |raw, _| Ok(Value::Text(unescape_text(raw))));
codec!(CalAddressCodec, |raw, _| Ok(Value::CalAddress(raw.to_owned())));
codec!(UriCodec, |raw, _| Ok(Value::Uri(raw.to_owned())));
codec!(TimeCodec, |raw, _| Ok(Value::Time(CalTime::parse(raw)?)));
codec!(DurationCodec, |raw, _| Ok(Value::Duration(parse_duration(raw)?)));
codec!(RecurCodec, |raw, _| Ok(Value::Recur(RecurRule::parse(raw)?)));
codec!(UtcOffsetCodec, |raw, _| Ok(Value::UtcOffset(UtcOffset::parse(raw)?)));
codec!(AddressCodec, |raw, _| Ok(Value::Address(Address(StructuredValue::parse(raw)))));
codec!(NameCodec, |raw, _| Ok(Value::Name(Name(StructuredValue::parse(raw)))));
codec!(OrganizationCodec, |raw, _| Ok(Value::Organization(Organization(
    StructuredValue::parse(raw)
))));
codec!(StructuredCodec, |raw, _| Ok(Value::Structured(StructuredValue::parse(raw))));
codec!(IntegerCodec, |raw, _| raw
    .trim()
    .parse()
    .map(Value::Integer)
    .map_err(|_| ValueDecodeError::InvalidInteger(raw.to_owned())));
codec!(FloatCodec, |raw, _| raw
    .trim()
    .parse::<f64>()
    .ok()
    .filter(|float| float.is_finite())
    .map(Value::Float)
    .ok_or_else(|| ValueDecodeError::InvalidFloat(raw.to_owned())));
codec!(BooleanCodec, |raw, _| match raw.to_ascii_uppercase().as_str() {
    "TRUE" => Ok(Value::Boolean(true)),
    "FALSE" => Ok(Value::Boolean(false)),
    _ => Err(ValueDecodeError::InvalidBoolean(raw.to_owned())),
});

/// `DATE` values. A `TZID` parameter is meaningless on dates and dropped on output.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCodec;

impl ValueCodec for DateCodec {
    fn decode(&self, raw: &str, ctx: &DecodeContext) -> Result<Value, ValueDecodeError> {
        match CalDateOrDateTime::parse(raw, ctx.tzid(), ctx.resolver)? {
            CalDateOrDateTime::Date(date) => Ok(Value::Date(date)),
            CalDateOrDateTime::DateTime(_) => Err(ValueDecodeError::InvalidDate(raw.to_owned())),
        }
    }

    fn encode(&self, value: &Value, params: &mut ContentLineParams) -> String {
        DateTimeCodec.encode(value, params)
    }
}

/// `DATE-TIME` values. Accepts a bare date, which decodes to [`Value::Date`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCodec;

impl ValueCodec for DateTimeCodec {
    fn decode(&self, raw: &str, ctx: &DecodeContext) -> Result<Value, ValueDecodeError> {
        Ok(CalDateOrDateTime::parse(raw, ctx.tzid(), ctx.resolver)?.into())
    }

    fn encode(&self, value: &Value, params: &mut ContentLineParams) -> String {
        sync_tzid(value, params);
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodCodec;

impl ValueCodec for PeriodCodec {
    fn decode(&self, raw: &str, ctx: &DecodeContext) -> Result<Value, ValueDecodeError> {
        Ok(Value::Period(Period::parse(raw, ctx.tzid(), ctx.resolver)?))
    }

    fn encode(&self, value: &Value, params: &mut ContentLineParams) -> String {
        sync_tzid(value, params);
        value.to_string()
    }
}

/// Zoned values carry their `TZID` parameter and floating ones drop it.
/// UTC values and dates leave whatever `TZID` was read untouched.
fn sync_tzid(value: &Value, params: &mut ContentLineParams) {
    match value.tzid() {
        Some(tzid) if params.get_tzid() != Some(tzid) => {
            params.replace_param("TZID".to_owned(), tzid.to_owned())
        }
        Some(_) => {}
        None if value.is_floating() => params.remove("TZID"),
        None => {}
    }
}

/// Base64 `BINARY` values (`ENCODING=BASE64` or vCard's `ENCODING=b`).
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl ValueCodec for BinaryCodec {
    fn decode(&self, raw: &str, _ctx: &DecodeContext) -> Result<Value, ValueDecodeError> {
        let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map(Value::Binary)
            .map_err(|err| ValueDecodeError::InvalidBinary(err.to_string()))
    }

    fn encode(&self, value: &Value, params: &mut ContentLineParams) -> String {
        if matches!(value, Value::Binary(_)) && !params.has_param("ENCODING") {
            params.push("ENCODING".to_owned(), vec!["BASE64".to_owned()]);
        }
        value.to_string()
    }
}

/// Every codec this crate ships with, keyed by tag.
pub fn builtin_codecs() -> Vec<(&'static str, Arc<dyn ValueCodec>)> {
    vec![
        (tag::TEXT, Arc::new(TextCodec)),
        (tag::DATE, Arc::new(DateCodec)),
        (tag::DATE_TIME, Arc::new(DateTimeCodec)),
        (tag::TIME, Arc::new(TimeCodec)),
        (tag::DURATION, Arc::new(DurationCodec)),
        (tag::PERIOD, Arc::new(PeriodCodec)),
        (tag::RECUR, Arc::new(RecurCodec)),
        (tag::INTEGER, Arc::new(IntegerCodec)),
        (tag::FLOAT, Arc::new(FloatCodec)),
        (tag::BOOLEAN, Arc::new(BooleanCodec)),
        (tag::BINARY, Arc::new(BinaryCodec)),
        (tag::CAL_ADDRESS, Arc::new(CalAddressCodec)),
        (tag::URI, Arc::new(UriCodec)),
        (tag::UTC_OFFSET, Arc::new(UtcOffsetCodec)),
        (tag::ADDRESS, Arc::new(AddressCodec)),
        (tag::NAME, Arc::new(NameCodec)),
        (tag::ORGANIZATION, Arc::new(OrganizationCodec)),
        (tag::STRUCTURED, Arc::new(StructuredCodec)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CalDate, NoTzResolver, Zone};
    use rstest::rstest;

    fn decode(codec: &dyn ValueCodec, raw: &str, params: &ContentLineParams) -> Result<Value, ValueDecodeError> {
        let ctx = DecodeContext {
            property: "X-TEST",
            params,
            resolver: &NoTzResolver,
        };
        codec.decode(raw, &ctx)
    }

    #[rstest]
    #[case(&TextCodec, "Meeting\\, John\\nRoom 1")]
    #[case(&IntegerCodec, "-42")]
    #[case(&FloatCodec, "37.386013")]
    #[case(&BooleanCodec, "TRUE")]
    #[case(&DurationCodec, "-P1DT2H")]
    #[case(&RecurCodec, "FREQ=MONTHLY;BYDAY=1SU")]
    #[case(&UtcOffsetCodec, "-0800")]
    #[case(&UriCodec, "http://example.com/a%3Ab\\,c")]
    #[case(&CalAddressCodec, "mailto:jane@example.com")]
    #[case(&TimeCodec, "230000")]
    #[case(&DateCodec, "19970714")]
    #[case(&DateTimeCodec, "19970714T173000Z")]
    #[case(&PeriodCodec, "19970308T160000Z/PT8H30M")]
    #[case(&BinaryCodec, "AAABAAEAEBA=")]
    #[case(&AddressCodec, ";;123 Main Street;Any Town;CA;91921-1234;U.S.A.")]
    #[case(&StructuredCodec, "2.0;Success")]
    fn canonical_roundtrip(#[case] codec: &dyn ValueCodec, #[case] raw: &str) {
        let mut params = ContentLineParams::default();
        let value = decode(codec, raw, &params).unwrap();
        assert_eq!(codec.encode(&value, &mut params), raw);
        // and back
        assert_eq!(decode(codec, &codec.encode(&value, &mut params), &params).unwrap(), value);
    }

    #[rstest]
    #[case(&IntegerCodec, "1.5")]
    #[case(&FloatCodec, "NaN")]
    #[case(&FloatCodec, "abc")]
    #[case(&BooleanCodec, "YES")]
    #[case(&DateCodec, "19970714T173000Z")]
    #[case(&DateTimeCodec, "NOT-A-DATE")]
    #[case(&BinaryCodec, "not base64!")]
    #[case(&RecurCodec, "INTERVAL=2")]
    fn decode_errors(#[case] codec: &dyn ValueCodec, #[case] raw: &str) {
        assert!(decode(codec, raw, &ContentLineParams::default()).is_err());
    }

    #[test]
    fn date_time_accepts_bare_date() {
        let value = decode(&DateTimeCodec, "20240101", &ContentLineParams::default()).unwrap();
        assert_eq!(value, Value::Date(CalDate::from_ymd(2024, 1, 1).unwrap()));
    }

    #[test]
    fn tzid_parameter_follows_the_value() {
        let mut params =
            ContentLineParams::from(vec![("TZID".to_owned(), vec!["America/New_York".to_owned()])]);
        let value = decode(&DateTimeCodec, "20240101T090000", &params).unwrap();
        let Value::DateTime(datetime) = &value else {
            panic!("expected a date-time");
        };
        assert_eq!(datetime.tzid(), Some("America/New_York"));
        assert_eq!(DateTimeCodec.encode(&value, &mut params), "20240101T090000");
        assert_eq!(params.get_tzid(), Some("America/New_York"));

        let floating = Value::DateTime(crate::types::CalDateTime {
            naive: datetime.naive,
            zone: Zone::Floating,
        });
        DateTimeCodec.encode(&floating, &mut params);
        assert_eq!(params.get_tzid(), None);
    }

    #[rstest]
    #[case(&DateTimeCodec, "20240101T100000Z")]
    #[case(&DateCodec, "20240101")]
    fn tzid_is_kept_where_the_value_ignores_it(#[case] codec: &dyn ValueCodec, #[case] raw: &str) {
        let mut params =
            ContentLineParams::from(vec![("TZID".to_owned(), vec!["Europe/Berlin".to_owned()])]);
        let value = decode(codec, raw, &params).unwrap();
        assert_eq!(value.tzid(), None);
        assert_eq!(codec.encode(&value, &mut params), raw);
        assert_eq!(params.get_tzid(), Some("Europe/Berlin"));
    }

    #[test]
    fn binary_ignores_whitespace_and_sets_encoding() {
        let mut params = ContentLineParams::default();
        let value = decode(&BinaryCodec, "aG Vs\tbG8=", &params).unwrap();
        assert_eq!(value, Value::Binary(b"hello".to_vec()));
        assert_eq!(BinaryCodec.encode(&value, &mut params), "aGVsbG8=");
        assert_eq!(params.get_param("ENCODING"), Some("BASE64"));
    }

    #[test]
    fn uri_keeps_percent_encoding() {
        let value = decode(&UriCodec, "http://example.com/%3A", &ContentLineParams::default()).unwrap();
        assert_eq!(value, Value::Uri("http://example.com/%3A".to_owned()));
    }
}
