use chrono::FixedOffset;
use derive_more::{Deref, From};
use lazy_static::lazy_static;
use regex::Regex;

use crate::types::ValueDecodeError;

lazy_static! {
    static ref RE_UTC_OFFSET: Regex = Regex::new(r"^([+-])(\d{2})(\d{2})(\d{2})?$").unwrap();
}

/// `UTC-OFFSET` value such as `-0500` or `+053045`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Deref)]
pub struct UtcOffset(pub FixedOffset);

impl UtcOffset {
    pub fn parse(value: &str) -> Result<Self, ValueDecodeError> {
        let err = || ValueDecodeError::InvalidUtcOffset(value.to_owned());
        let captures = RE_UTC_OFFSET.captures(value).ok_or_else(err)?;
        let number = |i: usize| {
            captures
                .get(i)
                .map_or(Ok(0), |m| m.as_str().parse::<i32>())
                .map_err(|_| err())
        };
        let (hours, minutes, seconds) = (number(2)?, number(3)?, number(4)?);
        if minutes > 59 || seconds > 59 {
            return Err(err());
        }
        let mut total = hours * 3600 + minutes * 60 + seconds;
        if &captures[1] == "-" {
            total = -total;
        }
        FixedOffset::east_opt(total).map(Self).ok_or_else(err)
    }

    pub fn format(&self) -> String {
        let total = self.0.local_minus_utc();
        let sign = if total < 0 { '-' } else { '+' };
        let total = total.unsigned_abs();
        let (hours, minutes, seconds) = (total / 3600, total / 60 % 60, total % 60);
        if seconds == 0 {
            format!("{sign}{hours:02}{minutes:02}")
        } else {
            format!("{sign}{hours:02}{minutes:02}{seconds:02}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("-0500", -5 * 3600)]
    #[case("+0100", 3600)]
    #[case("+0000", 0)]
    #[case("+053045", 5 * 3600 + 30 * 60 + 45)]
    fn roundtrip(#[case] input: &str, #[case] seconds: i32) {
        let offset = UtcOffset::parse(input).unwrap();
        assert_eq!(offset.local_minus_utc(), seconds);
        assert_eq!(offset.format(), input);
    }

    #[rstest]
    #[case("0500")]
    #[case("+05")]
    #[case("+0560")]
    #[case("+2500")]
    #[case("+05:00")]
    fn invalid(#[case] input: &str) {
        assert!(UtcOffset::parse(input).is_err());
    }
}
