use chrono::Duration;
use lazy_static::lazy_static;

lazy_static! {
    static ref RE_DURATION: regex::Regex = regex::Regex::new(
        r"^(?P<sign>[+-])?P((?P<W>\d+)W)?((?P<D>\d+)D)?(T((?P<H>\d+)H)?((?P<M>\d+)M)?((?P<S>\d+)S)?)?$"
    )
    .unwrap();
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Invalid duration: {0}")]
pub struct InvalidDuration(String);

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Parse an RFC 5545 `DURATION` such as `-P1W` or `P1DT2H3M4S`.
///
/// The designators may be mixed (`P1W2D` is accepted), but at least one is required.
pub fn parse_duration(string: &str) -> Result<Duration, InvalidDuration> {
    let err = || InvalidDuration(string.to_owned());
    let captures = RE_DURATION.captures(string).ok_or_else(err)?;

    let mut seconds: i64 = 0;
    let mut found = false;
    for (name, unit) in [
        ("W", SECONDS_PER_WEEK),
        ("D", SECONDS_PER_DAY),
        ("H", SECONDS_PER_HOUR),
        ("M", SECONDS_PER_MINUTE),
        ("S", 1),
    ] {
        let Some(amount) = captures.name(name) else {
            continue;
        };
        found = true;
        let amount: i64 = amount.as_str().parse().map_err(|_| err())?;
        seconds = amount
            .checked_mul(unit)
            .and_then(|part| seconds.checked_add(part))
            .ok_or_else(err)?;
    }
    if !found {
        return Err(err());
    }

    if captures.name("sign").map(|sign| sign.as_str()) == Some("-") {
        seconds = -seconds;
    }
    Duration::try_seconds(seconds).ok_or_else(err)
}

/// Whether `duration` can be written without losing anything.
#[inline]
pub fn is_whole_seconds(duration: &Duration) -> bool {
    duration.subsec_nanos() == 0
}

/// Shortest representation of `duration`. Sub-second parts are dropped, see [`is_whole_seconds`].
pub fn format_duration(duration: &Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let mut rest = total.unsigned_abs();

    if rest == 0 {
        return "PT0S".to_owned();
    }
    if rest % SECONDS_PER_WEEK as u64 == 0 {
        return format!("{sign}P{}W", rest / SECONDS_PER_WEEK as u64);
    }

    let mut out = format!("{sign}P");
    let days = rest / SECONDS_PER_DAY as u64;
    rest %= SECONDS_PER_DAY as u64;
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if rest > 0 {
        out.push('T');
        for (unit, designator) in [
            (SECONDS_PER_HOUR as u64, 'H'),
            (SECONDS_PER_MINUTE as u64, 'M'),
            (1, 'S'),
        ] {
            let amount = rest / unit;
            rest %= unit;
            if amount > 0 {
                out.push_str(&format!("{amount}{designator}"));
            }
        }
    }
    out
}
