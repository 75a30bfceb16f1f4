//! The timezone resolution seam.
//!
//! Decoding a zoned `DATE-TIME` hands its `TZID` to a [`TzResolver`] and attaches
//! whatever [`TzRules`] come back. No transition math happens in this crate.

use chrono::{FixedOffset, NaiveDateTime};
use std::{fmt, sync::Arc};

/// UTC offset rules of one timezone.
pub trait OffsetRules: Send + Sync {
    fn name(&self) -> &str;

    /// Offset in effect at a local wall-clock time, `None` if that time does not exist.
    /// Ambiguous times resolve to the earlier instant.
    fn offset_from_local(&self, local: &NaiveDateTime) -> Option<FixedOffset>;

    fn offset_from_utc(&self, utc: &NaiveDateTime) -> FixedOffset;
}

/// Shared handle to resolved offset rules. Compared by name.
#[derive(Clone)]
pub struct TzRules(Arc<dyn OffsetRules>);

impl TzRules {
    pub fn new(rules: impl OffsetRules + 'static) -> Self {
        Self(Arc::new(rules))
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    pub fn offset_from_local(&self, local: &NaiveDateTime) -> Option<FixedOffset> {
        self.0.offset_from_local(local)
    }

    #[inline]
    pub fn offset_from_utc(&self, utc: &NaiveDateTime) -> FixedOffset {
        self.0.offset_from_utc(utc)
    }
}

impl From<Arc<dyn OffsetRules>> for TzRules {
    fn from(rules: Arc<dyn OffsetRules>) -> Self {
        Self(rules)
    }
}

impl fmt::Debug for TzRules {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("TzRules").field(&self.name()).finish()
    }
}

impl PartialEq for TzRules {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for TzRules {}

/// Turns a `TZID` into offset rules.
pub trait TzResolver: Send + Sync {
    fn resolve(&self, tzid: &str) -> Option<TzRules>;
}

impl<F> TzResolver for F
where
    F: Fn(&str) -> Option<TzRules> + Send + Sync,
{
    fn resolve(&self, tzid: &str) -> Option<TzRules> {
        self(tzid)
    }
}

/// Resolves nothing. Zoned values keep their `TZID` without rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTzResolver;

impl TzResolver for NoTzResolver {
    fn resolve(&self, _tzid: &str) -> Option<TzRules> {
        None
    }
}

/// The resolver a fresh registry starts out with.
pub fn default_resolver() -> Arc<dyn TzResolver> {
    #[cfg(feature = "chrono-tz")]
    {
        Arc::new(ChronoTzResolver)
    }
    #[cfg(not(feature = "chrono-tz"))]
    {
        Arc::new(NoTzResolver)
    }
}

#[cfg(feature = "chrono-tz")]
mod olson {
    use super::{OffsetRules, TzResolver, TzRules};
    use chrono::{FixedOffset, NaiveDateTime, Offset, TimeZone};
    use std::str::FromStr;

    // Microsoft products like to put Windows zone names into TZID
    static PROPRIETARY_TZIDS: phf::Map<&'static str, chrono_tz::Tz> = phf::phf_map! {
        "W. Europe Standard Time" => chrono_tz::Europe::Berlin,
        "Central Europe Standard Time" => chrono_tz::Europe::Budapest,
        "Romance Standard Time" => chrono_tz::Europe::Paris,
        "GMT Standard Time" => chrono_tz::Europe::London,
        "E. Europe Standard Time" => chrono_tz::Europe::Chisinau,
        "FLE Standard Time" => chrono_tz::Europe::Helsinki,
        "Russian Standard Time" => chrono_tz::Europe::Moscow,
        "Eastern Standard Time" => chrono_tz::America::New_York,
        "Central Standard Time" => chrono_tz::America::Chicago,
        "Mountain Standard Time" => chrono_tz::America::Denver,
        "US Mountain Standard Time" => chrono_tz::America::Phoenix,
        "Pacific Standard Time" => chrono_tz::America::Los_Angeles,
        "Alaskan Standard Time" => chrono_tz::America::Anchorage,
        "Hawaiian Standard Time" => chrono_tz::Pacific::Honolulu,
        "Atlantic Standard Time" => chrono_tz::America::Halifax,
        "E. South America Standard Time" => chrono_tz::America::Sao_Paulo,
        "India Standard Time" => chrono_tz::Asia::Kolkata,
        "China Standard Time" => chrono_tz::Asia::Shanghai,
        "Tokyo Standard Time" => chrono_tz::Asia::Tokyo,
        "Korea Standard Time" => chrono_tz::Asia::Seoul,
        "Singapore Standard Time" => chrono_tz::Asia::Singapore,
        "AUS Eastern Standard Time" => chrono_tz::Australia::Sydney,
        "New Zealand Standard Time" => chrono_tz::Pacific::Auckland,
        "UTC" => chrono_tz::UTC,
        "Coordinated Universal Time" => chrono_tz::UTC,
    };

    pub fn get_proprietary_tzid(tzid: &str) -> Option<chrono_tz::Tz> {
        PROPRIETARY_TZIDS.get(tzid).copied()
    }

    impl OffsetRules for chrono_tz::Tz {
        fn name(&self) -> &str {
            chrono_tz::Tz::name(*self)
        }

        fn offset_from_local(&self, local: &NaiveDateTime) -> Option<FixedOffset> {
            self.offset_from_local_datetime(local)
                .earliest()
                .map(|offset| offset.fix())
        }

        fn offset_from_utc(&self, utc: &NaiveDateTime) -> FixedOffset {
            self.offset_from_utc_datetime(utc).fix()
        }
    }

    /// Looks `TZID`s up in the IANA database shipped with `chrono-tz`.
    ///
    /// A leading `/` (globally unique id) is ignored and common Windows zone
    /// names are mapped to their IANA counterpart.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ChronoTzResolver;

    impl TzResolver for ChronoTzResolver {
        fn resolve(&self, tzid: &str) -> Option<TzRules> {
            let tzid = tzid.strip_prefix('/').unwrap_or(tzid);
            chrono_tz::Tz::from_str(tzid)
                .ok()
                .or_else(|| get_proprietary_tzid(tzid))
                .map(TzRules::new)
        }
    }
}
#[cfg(feature = "chrono-tz")]
pub use olson::{ChronoTzResolver, get_proprietary_tzid};

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, i32);

    impl OffsetRules for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        fn offset_from_local(&self, _local: &NaiveDateTime) -> Option<FixedOffset> {
            FixedOffset::east_opt(self.1)
        }
        fn offset_from_utc(&self, _utc: &NaiveDateTime) -> FixedOffset {
            FixedOffset::east_opt(self.1).unwrap()
        }
    }

    #[test]
    fn closures_are_resolvers() {
        let resolver = |tzid: &str| (tzid == "Plus2").then(|| TzRules::new(Fixed("Plus2", 7200)));
        assert_eq!(resolver.resolve("Plus2").unwrap().name(), "Plus2");
        assert!(resolver.resolve("Other").is_none());
        assert!(NoTzResolver.resolve("Plus2").is_none());
    }

    #[test]
    fn rules_compare_by_name() {
        assert_eq!(TzRules::new(Fixed("A", 0)), TzRules::new(Fixed("A", 3600)));
        assert_ne!(TzRules::new(Fixed("A", 0)), TzRules::new(Fixed("B", 0)));
    }

    #[cfg(feature = "chrono-tz")]
    #[rstest::rstest]
    #[case("Europe/Berlin", "Europe/Berlin")]
    #[case("/Europe/Berlin", "Europe/Berlin")]
    #[case("W. Europe Standard Time", "Europe/Berlin")]
    #[case("Pacific Standard Time", "America/Los_Angeles")]
    fn chrono_tz_resolver(#[case] tzid: &str, #[case] name: &str) {
        assert_eq!(ChronoTzResolver.resolve(tzid).unwrap().name(), name);
    }

    #[cfg(feature = "chrono-tz")]
    #[test]
    fn chrono_tz_offsets() {
        use chrono::NaiveDate;
        let rules = ChronoTzResolver.resolve("Europe/Berlin").unwrap();
        let summer = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(rules.offset_from_local(&summer).unwrap().local_minus_utc(), 7200);
        assert_eq!(rules.offset_from_utc(&summer).local_minus_utc(), 7200);
        assert!(ChronoTzResolver.resolve("Mars/Olympus_Mons").is_none());
    }
}
