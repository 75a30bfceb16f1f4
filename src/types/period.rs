use chrono::Duration;

use crate::types::{
    CalDateTime, ConstructionError, TzResolver, ValueDecodeError, format_duration, is_whole_seconds,
    parse_duration,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodEnd {
    DateTime(CalDateTime),
    Duration(Duration),
}

/// `start/end` or `start/duration`.
///
/// Both ends share one zone: the end of a zoned period is read with the same `TZID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub start: CalDateTime,
    pub end: PeriodEnd,
}

impl Period {
    pub fn new(start: CalDateTime, end: PeriodEnd) -> Result<Self, ConstructionError> {
        match &end {
            PeriodEnd::DateTime(end) if !start.zone.is_consistent_with(&end.zone) => {
                return Err(ConstructionError::InconsistentPeriod);
            }
            PeriodEnd::Duration(duration) if !is_whole_seconds(duration) => {
                return Err(ConstructionError::FractionalSeconds(*duration));
            }
            _ => {}
        }
        Ok(Self { start, end })
    }

    pub fn parse(
        value: &str,
        tzid: Option<&str>,
        resolver: &dyn TzResolver,
    ) -> Result<Self, ValueDecodeError> {
        let err = |reason| ValueDecodeError::InvalidPeriod(value.to_owned(), reason);
        let (start, end) = value.split_once('/').ok_or(err("missing \"/\""))?;

        let start = CalDateTime::parse(start, tzid, resolver)?;
        let end = if end.starts_with(['P', '+', '-']) {
            PeriodEnd::Duration(parse_duration(end)?)
        } else {
            let end = CalDateTime::parse(end, tzid, resolver)?;
            if !start.zone.is_consistent_with(&end.zone) {
                return Err(err("start and end disagree about UTC"));
            }
            PeriodEnd::DateTime(end)
        };
        Ok(Self { start, end })
    }

    pub fn format(&self) -> String {
        let end = match &self.end {
            PeriodEnd::DateTime(end) => end.format(),
            PeriodEnd::Duration(duration) => format_duration(duration),
        };
        format!("{}/{end}", self.start.format())
    }

    #[inline]
    pub fn tzid(&self) -> Option<&str> {
        self.start.tzid()
    }
}
