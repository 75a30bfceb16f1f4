use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use derive_more::{Deref, From};
use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{ConstructionError, TzResolver, TzRules, ValueDecodeError};

const DATE_FORMAT: &str = "%Y%m%d";
const TIME_FORMAT: &str = "%H%M%S";

lazy_static! {
    static ref RE_DATE_TIME: Regex =
        Regex::new(r"^(\d{4})(\d{2})(\d{2})(?:[Tt](\d{2})(\d{2})(\d{2})([Zz])?)?$").unwrap();
    static ref RE_TIME: Regex = Regex::new(r"^(\d{2})(\d{2})(\d{2})([Zz])?$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Deref)]
pub struct CalDate(pub NaiveDate);

impl CalDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, ConstructionError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(ConstructionError::InvalidDate(year, month, day))
    }

    pub fn parse(value: &str) -> Result<Self, ValueDecodeError> {
        match CalDateOrDateTime::parse(value, None, &crate::types::NoTzResolver)? {
            CalDateOrDateTime::Date(date) => Ok(date),
            CalDateOrDateTime::DateTime(_) => Err(ValueDecodeError::InvalidDate(value.to_owned())),
        }
    }

    pub fn format(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }
}

/// A `TIME` value, floating or UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalTime {
    pub time: NaiveTime,
    pub utc: bool,
}

impl CalTime {
    pub fn from_hms(hour: u32, min: u32, sec: u32, utc: bool) -> Result<Self, ConstructionError> {
        NaiveTime::from_hms_opt(hour, min, sec)
            .map(|time| Self { time, utc })
            .ok_or(ConstructionError::InvalidTime(hour, min, sec))
    }

    pub fn parse(value: &str) -> Result<Self, ValueDecodeError> {
        let err = || ValueDecodeError::InvalidTime(value.to_owned());
        let captures = RE_TIME.captures(value).ok_or_else(err)?;
        let time = NaiveTime::from_hms_opt(
            captures[1].parse().map_err(|_| err())?,
            captures[2].parse().map_err(|_| err())?,
            captures[3].parse().map_err(|_| err())?,
        )
        .ok_or_else(err)?;
        Ok(Self {
            time,
            utc: captures.get(4).is_some(),
        })
    }

    pub fn format(&self) -> String {
        let time = self.time.format(TIME_FORMAT);
        if self.utc { format!("{time}Z") } else { time.to_string() }
    }
}

/// How a `DATE-TIME` relates to UTC.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Zone {
    /// No `Z` and no `TZID`: the same wall-clock time everywhere.
    #[default]
    Floating,
    Utc,
    /// Local time in the zone named by `TZID`. `rules` is whatever the
    /// resolver returned for it.
    Zoned { tzid: String, rules: Option<TzRules> },
}

impl Zone {
    #[inline]
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Zoned { tzid, .. } => Some(tzid),
            _ => None,
        }
    }

    /// Same kind of zone, and the same `TZID` when zoned.
    pub fn is_consistent_with(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Floating, Self::Floating) | (Self::Utc, Self::Utc) => true,
            (Self::Zoned { tzid: a, .. }, Self::Zoned { tzid: b, .. }) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalDateTime {
    pub naive: NaiveDateTime,
    pub zone: Zone,
}

impl CalDateTime {
    pub fn floating(naive: NaiveDateTime) -> Self {
        Self {
            naive,
            zone: Zone::Floating,
        }
    }

    pub fn utc(naive: NaiveDateTime) -> Self {
        Self {
            naive,
            zone: Zone::Utc,
        }
    }

    pub fn zoned(naive: NaiveDateTime, tzid: impl Into<String>, rules: Option<TzRules>) -> Self {
        Self {
            naive,
            zone: Zone::Zoned {
                tzid: tzid.into(),
                rules,
            },
        }
    }

    pub fn parse(
        value: &str,
        tzid: Option<&str>,
        resolver: &dyn TzResolver,
    ) -> Result<Self, ValueDecodeError> {
        match CalDateOrDateTime::parse(value, tzid, resolver)? {
            CalDateOrDateTime::DateTime(datetime) => Ok(datetime),
            CalDateOrDateTime::Date(_) => {
                Err(ValueDecodeError::InvalidDateTime(value.to_owned()))
            }
        }
    }

    #[inline]
    pub fn tzid(&self) -> Option<&str> {
        self.zone.tzid()
    }

    #[inline]
    pub fn is_utc(&self) -> bool {
        self.zone == Zone::Utc
    }

    #[inline]
    pub fn is_floating(&self) -> bool {
        self.zone == Zone::Floating
    }

    /// The instant this value denotes.
    ///
    /// `None` for floating values, for zoned values whose `TZID` did not resolve,
    /// and for local times skipped by a DST transition.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match &self.zone {
            Zone::Utc => Some(self.naive.and_utc()),
            Zone::Floating | Zone::Zoned { rules: None, .. } => None,
            Zone::Zoned {
                rules: Some(rules), ..
            } => {
                let offset = rules.offset_from_local(&self.naive)?;
                let utc = self
                    .naive
                    .checked_sub_signed(chrono::Duration::seconds(offset.local_minus_utc().into()))?;
                Some(utc.and_utc())
            }
        }
    }

    pub fn format(&self) -> String {
        let datetime = self.naive.format("%Y%m%dT%H%M%S");
        if self.is_utc() {
            format!("{datetime}Z")
        } else {
            datetime.to_string()
        }
    }
}

/// What a `DATE-TIME` property may hold: a full date-time or just a date.
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum CalDateOrDateTime {
    Date(CalDate),
    DateTime(CalDateTime),
}

impl CalDateOrDateTime {
    /// Parse `YYYYMMDD` or `YYYYMMDDTHHMMSS[Z]`.
    ///
    /// A `tzid` only applies to date-times without `Z`; it is looked up through `resolver`.
    pub fn parse(
        value: &str,
        tzid: Option<&str>,
        resolver: &dyn TzResolver,
    ) -> Result<Self, ValueDecodeError> {
        let captures = RE_DATE_TIME
            .captures(value)
            .ok_or_else(|| ValueDecodeError::InvalidDateTime(value.to_owned()))?;
        let number = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        let date = captures[1]
            .parse::<i32>()
            .ok()
            .zip(number(2))
            .zip(number(3))
            .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
            .ok_or_else(|| ValueDecodeError::InvalidDate(value.to_owned()))?;

        let Some(hour) = number(4) else {
            return Ok(Self::Date(CalDate(date)));
        };
        let naive = number(5)
            .zip(number(6))
            .and_then(|(min, sec)| date.and_hms_opt(hour, min, sec))
            .ok_or_else(|| ValueDecodeError::InvalidDateTime(value.to_owned()))?;

        let zone = match (captures.get(7), tzid) {
            (Some(_), _) => Zone::Utc,
            (None, Some(tzid)) => Zone::Zoned {
                tzid: tzid.to_owned(),
                rules: resolver.resolve(tzid),
            },
            (None, None) => Zone::Floating,
        };
        Ok(Self::DateTime(CalDateTime { naive, zone }))
    }

    #[inline]
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(datetime) => datetime.tzid(),
        }
    }

    pub fn format(&self) -> String {
        match self {
            Self::Date(date) => date.format(),
            Self::DateTime(datetime) => datetime.format(),
        }
    }
}
