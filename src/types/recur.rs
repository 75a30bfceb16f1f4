//! `RECUR` values (RFC 5545 3.3.10).
//!
//! A rule is kept as the ordered list of its parts so that re-encoding writes the
//! keys back in the order they were read, unknown extension keys included.
//! Occurrence expansion is left to the `rrule` crate.

use chrono::Weekday;
use derive_more::Display;
use itertools::Itertools;
use std::str::FromStr;

use crate::types::{CalDateOrDateTime, ConstructionError, NoTzResolver, ValueDecodeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Frequency {
    #[display("SECONDLY")]
    Secondly,
    #[display("MINUTELY")]
    Minutely,
    #[display("HOURLY")]
    Hourly,
    #[display("DAILY")]
    Daily,
    #[display("WEEKLY")]
    Weekly,
    #[display("MONTHLY")]
    Monthly,
    #[display("YEARLY")]
    Yearly,
}

impl FromStr for Frequency {
    type Err = ValueDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return Err(ValueDecodeError::InvalidRecur(format!("unknown FREQ {s:?}"))),
        })
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    Some(match s.to_ascii_uppercase().as_str() {
        "MO" => Weekday::Mon,
        "TU" => Weekday::Tue,
        "WE" => Weekday::Wed,
        "TH" => Weekday::Thu,
        "FR" => Weekday::Fri,
        "SA" => Weekday::Sat,
        "SU" => Weekday::Sun,
        _ => return None,
    })
}

fn format_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// `BYDAY` entry such as `MO`, `-1FR` or `+20SU`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    pub ordinal: Option<i16>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    pub fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    pub fn nth(ordinal: i16, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl FromStr for WeekdayNum {
    type Err = ValueDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ValueDecodeError::InvalidRecur(format!("invalid BYDAY entry {s:?}"));
        let split = s.len().checked_sub(2).filter(|pos| s.is_char_boundary(*pos)).ok_or_else(err)?;
        let (ordinal, weekday) = s.split_at(split);
        let weekday = parse_weekday(weekday).ok_or_else(err)?;
        let ordinal = match ordinal {
            "" => None,
            ordinal => {
                let ordinal: i16 = ordinal.parse().map_err(|_| err())?;
                if ordinal == 0 || !(-53..=53).contains(&ordinal) {
                    return Err(err());
                }
                Some(ordinal)
            }
        };
        Ok(Self { ordinal, weekday })
    }
}

impl std::fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(ordinal) = self.ordinal {
            write!(f, "{ordinal}")?;
        }
        f.write_str(format_weekday(self.weekday))
    }
}

/// One `KEY=value` part of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurPart {
    Freq(Frequency),
    Until(CalDateOrDateTime),
    Count(u32),
    Interval(u32),
    BySecond(Vec<u8>),
    ByMinute(Vec<u8>),
    ByHour(Vec<u8>),
    ByDay(Vec<WeekdayNum>),
    ByMonthDay(Vec<i8>),
    ByYearDay(Vec<i16>),
    ByWeekNo(Vec<i8>),
    ByMonth(Vec<u8>),
    BySetPos(Vec<i16>),
    Wkst(Weekday),
    /// Extension or unknown key, kept verbatim.
    Other { name: String, value: String },
}

fn parse_list<T: FromStr>(
    key: &str,
    value: &str,
    valid: impl Fn(&T) -> bool,
) -> Result<Vec<T>, ValueDecodeError> {
    value
        .split(',')
        .map(|item| {
            item.parse::<T>()
                .ok()
                .filter(&valid)
                .ok_or_else(|| ValueDecodeError::InvalidRecur(format!("invalid {key} entry {item:?}")))
        })
        .collect()
}

fn non_zero_within<T: Into<i32> + Copy>(bound: i32) -> impl Fn(&T) -> bool {
    move |value: &T| {
        let value: i32 = (*value).into();
        value != 0 && (-bound..=bound).contains(&value)
    }
}

impl RecurPart {
    pub fn name(&self) -> &str {
        match self {
            Self::Freq(_) => "FREQ",
            Self::Until(_) => "UNTIL",
            Self::Count(_) => "COUNT",
            Self::Interval(_) => "INTERVAL",
            Self::BySecond(_) => "BYSECOND",
            Self::ByMinute(_) => "BYMINUTE",
            Self::ByHour(_) => "BYHOUR",
            Self::ByDay(_) => "BYDAY",
            Self::ByMonthDay(_) => "BYMONTHDAY",
            Self::ByYearDay(_) => "BYYEARDAY",
            Self::ByWeekNo(_) => "BYWEEKNO",
            Self::ByMonth(_) => "BYMONTH",
            Self::BySetPos(_) => "BYSETPOS",
            Self::Wkst(_) => "WKST",
            Self::Other { name, .. } => name,
        }
    }

    pub fn parse(key: &str, value: &str) -> Result<Self, ValueDecodeError> {
        let positive = |value: &str| {
            value
                .parse::<u32>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| ValueDecodeError::InvalidRecur(format!("invalid {key} {value:?}")))
        };
        Ok(match key.to_ascii_uppercase().as_str() {
            "FREQ" => Self::Freq(value.parse()?),
            "UNTIL" => Self::Until(CalDateOrDateTime::parse(value, None, &NoTzResolver)?),
            "COUNT" => Self::Count(positive(value)?),
            "INTERVAL" => Self::Interval(positive(value)?),
            "BYSECOND" => Self::BySecond(parse_list(key, value, |v: &u8| *v <= 60)?),
            "BYMINUTE" => Self::ByMinute(parse_list(key, value, |v: &u8| *v <= 59)?),
            "BYHOUR" => Self::ByHour(parse_list(key, value, |v: &u8| *v <= 23)?),
            "BYDAY" => Self::ByDay(
                value
                    .split(',')
                    .map(WeekdayNum::from_str)
                    .collect::<Result<_, _>>()?,
            ),
            "BYMONTHDAY" => Self::ByMonthDay(parse_list(key, value, non_zero_within::<i8>(31))?),
            "BYYEARDAY" => Self::ByYearDay(parse_list(key, value, non_zero_within::<i16>(366))?),
            "BYWEEKNO" => Self::ByWeekNo(parse_list(key, value, non_zero_within::<i8>(53))?),
            "BYMONTH" => Self::ByMonth(parse_list(key, value, |v: &u8| (1..=12).contains(v))?),
            "BYSETPOS" => Self::BySetPos(parse_list(key, value, non_zero_within::<i16>(366))?),
            "WKST" => Self::Wkst(parse_weekday(value).ok_or_else(|| {
                ValueDecodeError::InvalidRecur(format!("invalid WKST {value:?}"))
            })?),
            _ => Self::Other {
                name: key.to_owned(),
                value: value.to_owned(),
            },
        })
    }

    fn value(&self) -> String {
        match self {
            Self::Freq(freq) => freq.to_string(),
            Self::Until(until) => until.format(),
            Self::Count(n) | Self::Interval(n) => n.to_string(),
            Self::BySecond(list) | Self::ByMinute(list) | Self::ByHour(list) | Self::ByMonth(list) => {
                list.iter().join(",")
            }
            Self::ByDay(list) => list.iter().join(","),
            Self::ByMonthDay(list) | Self::ByWeekNo(list) => list.iter().join(","),
            Self::ByYearDay(list) | Self::BySetPos(list) => list.iter().join(","),
            Self::Wkst(weekday) => format_weekday(*weekday).to_owned(),
            Self::Other { value, .. } => value.clone(),
        }
    }

    #[inline]
    fn is_standard(&self) -> bool {
        !matches!(self, Self::Other { .. })
    }
}

impl std::fmt::Display for RecurPart {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}={}", self.name(), self.value())
    }
}

/// A decoded recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurRule {
    parts: Vec<RecurPart>,
}

impl RecurRule {
    pub fn new(freq: Frequency) -> Self {
        Self {
            parts: vec![RecurPart::Freq(freq)],
        }
    }

    /// Append a part, keeping the rule valid.
    pub fn with(mut self, part: RecurPart) -> Result<Self, ConstructionError> {
        self.parts.push(part);
        match self.validate() {
            Ok(()) => Ok(self),
            Err(ValueDecodeError::InvalidRecur(reason)) => Err(ConstructionError::InvalidRecur(reason)),
            Err(other) => Err(ConstructionError::InvalidRecur(other.to_string())),
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValueDecodeError> {
        let parts = value
            .split(';')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').ok_or_else(|| {
                    ValueDecodeError::InvalidRecur(format!("missing \"=\" in {part:?}"))
                })?;
                RecurPart::parse(key, value)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rule = Self { parts };
        rule.validate()?;
        Ok(rule)
    }

    fn validate(&self) -> Result<(), ValueDecodeError> {
        if let Some(duplicate) = self
            .parts
            .iter()
            .map(|part| part.name().to_ascii_uppercase())
            .duplicates()
            .next()
        {
            return Err(ValueDecodeError::InvalidRecur(format!("duplicate {duplicate}")));
        }
        if self.freq().is_none() {
            return Err(ValueDecodeError::InvalidRecur("missing FREQ".to_owned()));
        }
        if self.count().is_some() && self.until().is_some() {
            return Err(ValueDecodeError::InvalidRecur(
                "COUNT and UNTIL are mutually exclusive".to_owned(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn parts(&self) -> &[RecurPart] {
        &self.parts
    }

    pub fn get(&self, name: &str) -> Option<&RecurPart> {
        self.parts
            .iter()
            .find(|part| part.name().eq_ignore_ascii_case(name))
    }

    pub fn freq(&self) -> Option<Frequency> {
        self.parts.iter().find_map(|part| match part {
            RecurPart::Freq(freq) => Some(*freq),
            _ => None,
        })
    }

    pub fn count(&self) -> Option<u32> {
        self.parts.iter().find_map(|part| match part {
            RecurPart::Count(count) => Some(*count),
            _ => None,
        })
    }

    pub fn until(&self) -> Option<&CalDateOrDateTime> {
        self.parts.iter().find_map(|part| match part {
            RecurPart::Until(until) => Some(until),
            _ => None,
        })
    }

    pub fn interval(&self) -> u32 {
        self.parts
            .iter()
            .find_map(|part| match part {
                RecurPart::Interval(interval) => Some(*interval),
                _ => None,
            })
            .unwrap_or(1)
    }

    pub fn by_day(&self) -> &[WeekdayNum] {
        self.parts
            .iter()
            .find_map(|part| match part {
                RecurPart::ByDay(days) => Some(days.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn format(&self) -> String {
        self.parts.iter().join(";")
    }

    /// The standard parts as an `rrule` crate rule. Extension keys are left out.
    pub fn to_rrule(&self) -> Result<rrule::RRule<rrule::Unvalidated>, rrule::RRuleError> {
        let text = self.parts.iter().filter(|part| part.is_standard()).join(";");
        rrule::RRule::from_str(&text)
    }

    /// Up to `limit` occurrences starting at `dtstart`.
    pub fn expand(
        &self,
        dtstart: chrono::DateTime<rrule::Tz>,
        limit: u16,
    ) -> Result<Vec<chrono::DateTime<rrule::Tz>>, rrule::RRuleError> {
        Ok(self.to_rrule()?.build(dtstart)?.all(limit).dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("FREQ=DAILY;COUNT=10")]
    #[case("FREQ=WEEKLY;INTERVAL=2;WKST=SU;BYDAY=TU,TH")]
    #[case("FREQ=MONTHLY;BYDAY=-1FR")]
    #[case("FREQ=YEARLY;BYDAY=20MO")]
    #[case("FREQ=YEARLY;BYWEEKNO=-53;BYYEARDAY=1,100,-366")]
    #[case("FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1")]
    #[case("FREQ=DAILY;UNTIL=19971224T000000Z")]
    #[case("FREQ=YEARLY;UNTIL=20000131;BYMONTH=1;BYDAY=SU,MO")]
    #[case("BYMONTH=1;FREQ=YEARLY")]
    #[case("FREQ=DAILY;X-NAME=some value;BYHOUR=9,10")]
    fn roundtrip(#[case] input: &str) {
        assert_eq!(RecurRule::parse(input).unwrap().format(), input);
    }

    #[test]
    fn tolerates_trailing_semicolon() {
        let rule = RecurRule::parse("FREQ=WEEKLY;BYDAY=MO;").unwrap();
        assert_eq!(rule.format(), "FREQ=WEEKLY;BYDAY=MO");
    }

    #[test]
    fn multi_digit_ordinals() {
        let rule = RecurRule::parse("FREQ=YEARLY;BYDAY=+20MO,-10FR").unwrap();
        assert_eq!(
            rule.by_day(),
            [WeekdayNum::nth(20, Weekday::Mon), WeekdayNum::nth(-10, Weekday::Fri)]
        );
        assert_eq!(rule.format(), "FREQ=YEARLY;BYDAY=20MO,-10FR");
    }

    #[test]
    fn keeps_extension_keys() {
        let rule = RecurRule::parse("FREQ=DAILY;X-SKIP=YES").unwrap();
        assert_eq!(
            rule.get("x-skip"),
            Some(&RecurPart::Other {
                name: "X-SKIP".to_owned(),
                value: "YES".to_owned()
            })
        );
        assert_eq!(rule.interval(), 1);
    }

    #[rstest]
    #[case("")]
    #[case("COUNT=1")]
    #[case("FREQ=FORTNIGHTLY")]
    #[case("FREQ=DAILY;COUNT=0")]
    #[case("FREQ=DAILY;COUNT=2;UNTIL=20240101")]
    #[case("FREQ=DAILY;FREQ=WEEKLY")]
    #[case("FREQ=DAILY;BYDAY=0MO")]
    #[case("FREQ=DAILY;BYDAY=XX")]
    #[case("FREQ=DAILY;BYMONTH=13")]
    #[case("FREQ=DAILY;BYMONTHDAY=0")]
    #[case("FREQ=DAILY;BYHOUR=24")]
    #[case("FREQ=DAILY;INTERVAL")]
    fn invalid(#[case] input: &str) {
        assert!(RecurRule::parse(input).is_err());
    }

    #[test]
    fn builder() {
        let rule = RecurRule::new(Frequency::Weekly)
            .with(RecurPart::ByDay(vec![WeekdayNum::every(Weekday::Mon)]))
            .unwrap()
            .with(RecurPart::Count(4))
            .unwrap();
        assert_eq!(rule.format(), "FREQ=WEEKLY;BYDAY=MO;COUNT=4");
        assert!(matches!(
            rule.with(RecurPart::Count(2)),
            Err(ConstructionError::InvalidRecur(_))
        ));
    }

    #[test]
    fn expand() {
        use chrono::TimeZone;
        let rule = RecurRule::parse("FREQ=DAILY;COUNT=3;X-IGNORED=1").unwrap();
        let dtstart = rrule::Tz::UTC.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let dates = rule.expand(dtstart, 10).unwrap();
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[2], rrule::Tz::UTC.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap());
    }
}
