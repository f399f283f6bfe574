//! YAML adapter.
//!
//! Decoding drives the `yaml-rust2` event parser directly so that scalar
//! style and tags are still visible when a plain scalar is resolved; the
//! emitter is written by hand for the same reason. Both sides share
//! [`resolve_plain`], which is what keeps a written plain scalar reading
//! back as the same kind.

mod de;
mod ser;

pub use de::decode;
pub use ser::encode;

use crate::Value;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use regex::Regex;
use std::sync::OnceLock;

fn regex(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn int_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex(&RE, r"^[-+]?[0-9]+$")
}

fn float_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex(&RE, r"^[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?$")
}

fn date_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex(&RE, r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})$")
}

fn datetime_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex(
        &RE,
        r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})(?:[Tt]|[ \t]+)([0-9]{1,2}):([0-9]{2}):([0-9]{2})(?:\.([0-9]*))?(?:[ \t]*(Z|z|[-+][0-9]{1,2}(?::?[0-9]{2})?))?$",
    )
}

fn time_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex(&RE, r"^([0-9]{2}):([0-9]{2}):([0-9]{2})(?:\.([0-9]+))?$")
}

/// Resolves an untagged plain scalar with the core schema plus timestamps
/// and local times. Anything unrecognized stays a string.
pub(crate) fn resolve_plain(s: &str) -> Value {
    match s {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        _ => {}
    }
    parse_int(s)
        .map(Value::Integer)
        .or_else(|| parse_float(s).map(Value::Float))
        .or_else(|| parse_timestamp(s))
        .or_else(|| parse_time(s).map(Value::LocalTime))
        .unwrap_or_else(|| Value::String(s.to_string()))
}

pub(crate) fn parse_int(s: &str) -> Option<BigInt> {
    if let Some(hex) = s.strip_prefix("0x") {
        return BigInt::parse_bytes(hex.as_bytes(), 16);
    }
    if let Some(oct) = s.strip_prefix("0o") {
        return BigInt::parse_bytes(oct.as_bytes(), 8);
    }
    if !int_re()?.is_match(s) {
        return None;
    }
    s.strip_prefix('+').unwrap_or(s).parse().ok()
}

pub(crate) fn parse_float(s: &str) -> Option<f64> {
    match s {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ if float_re().is_some_and(|re| re.is_match(s)) => s.parse().ok(),
        _ => None,
    }
}

/// Date, local date-time or offset date-time, by which parts are present.
pub(crate) fn parse_timestamp(s: &str) -> Option<Value> {
    if let Some(caps) = date_re()?.captures(s) {
        return ymd(&caps[1], &caps[2], &caps[3]).map(Value::LocalDate);
    }
    let caps = datetime_re()?.captures(s)?;
    let date = ymd(&caps[1], &caps[2], &caps[3])?;
    let time = hms(&caps[4], &caps[5], &caps[6], caps.get(7).map(|m| m.as_str()))?;
    let local = NaiveDateTime::new(date, time);
    match caps.get(8).map(|m| m.as_str()) {
        None => Some(Value::LocalDateTime(local)),
        Some(tz) => {
            let offset = offset(tz)?;
            local
                .and_local_timezone(offset)
                .single()
                .map(|dt: DateTime<FixedOffset>| Value::OffsetDateTime(dt))
        }
    }
}

pub(crate) fn parse_time(s: &str) -> Option<NaiveTime> {
    let caps = time_re()?.captures(s)?;
    hms(&caps[1], &caps[2], &caps[3], caps.get(4).map(|m| m.as_str()))
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

fn hms(h: &str, m: &str, s: &str, fraction: Option<&str>) -> Option<NaiveTime> {
    let nanos = match fraction.filter(|f| !f.is_empty()) {
        None => 0,
        Some(f) => {
            // Digits past nanoseconds are dropped.
            let digits: String = f.chars().chain(std::iter::repeat('0')).take(9).collect();
            digits.parse().ok()?
        }
    };
    NaiveTime::from_hms_nano_opt(h.parse().ok()?, m.parse().ok()?, s.parse().ok()?, nanos)
}

fn offset(tz: &str) -> Option<FixedOffset> {
    if tz.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = tz.split_at(1);
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() > 2 => rest.split_at(rest.len() - 2),
        None => (rest, "0"),
    };
    let seconds = hours.parse::<i32>().ok()? * 3600 + minutes.parse::<i32>().ok()? * 60;
    FixedOffset::east_opt(if sign == "-" { -seconds } else { seconds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueKind;

    #[test]
    fn test_core_schema() {
        assert_eq!(resolve_plain("~"), Value::Null);
        assert_eq!(resolve_plain(""), Value::Null);
        assert_eq!(resolve_plain("True"), Value::Bool(true));
        assert_eq!(resolve_plain("0x1F"), Value::from(31));
        assert_eq!(resolve_plain("0o17"), Value::from(15));
        assert_eq!(resolve_plain("+12"), Value::from(12));
        assert_eq!(resolve_plain("-.inf"), Value::Float(f64::NEG_INFINITY));
        assert_eq!(resolve_plain("1e3"), Value::Float(1000.0));
        assert!(matches!(resolve_plain(".NaN"), Value::Float(f) if f.is_nan()));
        assert_eq!(resolve_plain("yes"), Value::from("yes"));
        assert_eq!(resolve_plain("1.2.3"), Value::from("1.2.3"));
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(resolve_plain("2001-12-14").kind(), ValueKind::LocalDate);
        assert_eq!(resolve_plain("2001-12-14 21:59:43.10").kind(), ValueKind::LocalDateTime);
        assert_eq!(resolve_plain("2001-12-14t21:59:43.10-05:00").kind(), ValueKind::OffsetDateTime);
        assert_eq!(resolve_plain("2001-12-14 21:59:43.10 -5").kind(), ValueKind::OffsetDateTime);
        assert_eq!(resolve_plain("21:59:43").kind(), ValueKind::LocalTime);
        assert_eq!(resolve_plain("2001-13-14"), Value::from("2001-13-14"));

        let Value::OffsetDateTime(dt) = resolve_plain("2001-12-14 21:59:43 -0530") else {
            panic!("not an offset date-time");
        };
        assert_eq!(dt.offset().local_minus_utc(), -(5 * 3600 + 30 * 60));
    }

    #[test]
    fn test_fraction_precision() {
        let t = parse_time("07:32:00.123456789123").unwrap();
        assert_eq!(t, NaiveTime::from_hms_nano_opt(7, 32, 0, 123_456_789).unwrap());
    }
}
