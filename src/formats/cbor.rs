//! CBOR adapter (`ciborium`).
//!
//! | tag  | content          | kind                 |
//! |------|------------------|----------------------|
//! | 0    | RFC 3339 text    | offset date-time     |
//! | 1    | epoch seconds    | offset date-time     |
//! | 100  | days since epoch | local date           |
//! | 1004 | full-date text   | local date           |
//! | 2, 3 | big-endian bytes | integer (bignum)     |
//!
//! Any other tag is transparent. Local times and local date-times have no
//! tag and are never written.

use crate::value::{format_date, format_offset_datetime};
use crate::{Error, Format, Key, Path, Position, Result, Table, Value, ValueGuard, ValueKind};
use chrono::{DateTime, NaiveDate, Offset, Utc};
use ciborium::value::{Integer, Value as Cbor};
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive};

const TAG_DATETIME: u64 = 0;
const TAG_EPOCH: u64 = 1;
const TAG_BIGPOS: u64 = 2;
const TAG_BIGNEG: u64 = 3;
const TAG_EPOCH_DAYS: u64 = 100;
const TAG_FULL_DATE: u64 = 1004;

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn decode(input: &[u8], guard: &mut ValueGuard) -> Result<Value> {
    let mut reader = input;
    let native: Cbor = ciborium::de::from_reader(&mut reader).map_err(|e| {
        let (position, msg) = match e {
            ciborium::de::Error::Io(io) => (Position::Unknown, io.to_string()),
            ciborium::de::Error::Syntax(offset) => {
                (Position::Offset(offset), "invalid CBOR syntax".to_string())
            }
            ciborium::de::Error::Semantic(offset, msg) => {
                (offset.map_or(Position::Unknown, Position::Offset), msg)
            }
            ciborium::de::Error::RecursionLimitExceeded => {
                (Position::Unknown, "nesting too deep".to_string())
            }
        };
        Error::decode(Format::Cbor, position, msg)
    })?;
    if !reader.is_empty() {
        return Err(Error::decode(
            Format::Cbor,
            Position::Offset(input.len() - reader.len()),
            "trailing data after the first item",
        ));
    }
    normalize(native, guard)
}

fn invalid<T: std::fmt::Display>(msg: T) -> Error {
    Error::decode(Format::Cbor, Position::Unknown, msg)
}

fn normalize(native: Cbor, guard: &mut ValueGuard) -> Result<Value> {
    if !matches!(native, Cbor::Tag(..)) {
        guard.tick()?;
    }
    Ok(match native {
        Cbor::Null => Value::Null,
        Cbor::Bool(b) => Value::Bool(b),
        Cbor::Integer(i) => Value::Integer(BigInt::from(i128::from(i))),
        Cbor::Float(f) => Value::Float(f),
        Cbor::Text(s) => Value::String(s),
        Cbor::Bytes(bytes) => Value::Binary(bytes),
        Cbor::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(normalize(item, guard)?);
            }
            Value::Array(out)
        }
        Cbor::Map(entries) => {
            let mut table = Table::with_capacity(entries.len());
            for (k, v) in entries {
                table.insert(key(k)?, normalize(v, guard)?);
            }
            Value::Table(table)
        }
        Cbor::Tag(tag, content) => tagged(tag, *content, guard)?,
        other => return Err(invalid(format!("unsupported CBOR item {:?}", other))),
    })
}

/// Map keys are not counted as values.
fn key(native: Cbor) -> Result<Key> {
    normalize(native, &mut ValueGuard::unlimited())?
        .into_key()
        .map_err(|k| invalid(format!("{} cannot be a map key", k.kind())))
}

fn tagged(tag: u64, content: Cbor, guard: &mut ValueGuard) -> Result<Value> {
    let value = match (tag, content) {
        (TAG_DATETIME, Cbor::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .map(Value::OffsetDateTime)
            .map_err(|e| invalid(format!("tag 0 {:?}: {}", text, e)))?,
        (TAG_EPOCH, Cbor::Integer(secs)) => epoch(i128::from(secs) as f64)?,
        (TAG_EPOCH, Cbor::Float(secs)) => epoch(secs)?,
        (TAG_FULL_DATE, Cbor::Text(text)) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(Value::LocalDate)
            .map_err(|e| invalid(format!("tag 1004 {:?}: {}", text, e)))?,
        (TAG_EPOCH_DAYS, Cbor::Integer(days)) => i32::try_from(i128::from(days))
            .ok()
            .and_then(|d| d.checked_add(UNIX_EPOCH_DAYS_FROM_CE))
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(Value::LocalDate)
            .ok_or_else(|| invalid("tag 100 day count out of range"))?,
        (TAG_BIGPOS, Cbor::Bytes(bytes)) => {
            Value::Integer(BigInt::from_bytes_be(Sign::Plus, &bytes))
        }
        (TAG_BIGNEG, Cbor::Bytes(bytes)) => {
            Value::Integer(-BigInt::from(1) - BigInt::from_bytes_be(Sign::Plus, &bytes))
        }
        (TAG_DATETIME | TAG_EPOCH | TAG_FULL_DATE | TAG_EPOCH_DAYS | TAG_BIGPOS | TAG_BIGNEG, _) => {
            return Err(invalid(format!("unexpected content for tag {}", tag)))
        }
        (_, content) => return normalize(content, guard),
    };
    guard.tick()?;
    Ok(value)
}

fn epoch(secs: f64) -> Result<Value> {
    if !secs.is_finite() {
        return Err(invalid("tag 1 epoch is not finite"));
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
        .map(|dt| Value::OffsetDateTime(dt.with_timezone(&Utc.fix())))
        .ok_or_else(|| invalid("tag 1 epoch out of range"))
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let native = to_native(value, &mut Path::root())?;
    let mut out = Vec::with_capacity(128);
    ciborium::ser::into_writer(&native, &mut out)
        .map_err(|e| Error::encode(Format::Cbor, None, &Path::root(), format!("{:?}", e)))?;
    Ok(out)
}

fn to_native(value: &Value, path: &mut Path) -> Result<Cbor> {
    Ok(match value {
        Value::Null => Cbor::Null,
        Value::Bool(b) => Cbor::Bool(*b),
        Value::Integer(i) => integer(i),
        Value::Float(f) => Cbor::Float(*f),
        Value::String(s) => Cbor::Text(s.clone()),
        Value::Binary(bytes) => Cbor::Bytes(bytes.clone()),
        Value::LocalDate(d) => tag(TAG_FULL_DATE, Cbor::Text(format_date(d))),
        Value::OffsetDateTime(dt) => tag(TAG_DATETIME, Cbor::Text(format_offset_datetime(dt))),
        Value::LocalTime(_) | Value::LocalDateTime(_) => {
            return Err(Error::encode(
                Format::Cbor,
                Some(value.kind()),
                path,
                format!("{} values are not supported", value.kind()),
            ))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push_index(i);
                out.push(to_native(item, path)?);
                path.pop();
            }
            Cbor::Array(out)
        }
        Value::Table(table) => {
            let mut entries = Vec::with_capacity(table.len());
            for (k, v) in table {
                if let Key::LocalTime(_) | Key::LocalDateTime(_) = k {
                    return Err(super::key_error(Format::Cbor, k, path));
                }
                let key = to_native(&Value::from(k.clone()), path)?;
                path.push_key(k.clone());
                entries.push((key, to_native(v, path)?));
                path.pop();
            }
            Cbor::Map(entries)
        }
    })
}

fn tag(tag: u64, content: Cbor) -> Cbor {
    Cbor::Tag(tag, Box::new(content))
}

fn integer(i: &BigInt) -> Cbor {
    if let Some(small) = i.to_i128().and_then(|n| Integer::try_from(n).ok()) {
        return Cbor::Integer(small);
    }
    if i.is_negative() {
        let magnitude = -(i + BigInt::from(1));
        tag(TAG_BIGNEG, Cbor::Bytes(magnitude.to_bytes_be().1))
    } else {
        tag(TAG_BIGPOS, Cbor::Bytes(i.to_bytes_be().1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon;
    use chrono::{NaiveTime, Timelike};

    fn decode_bytes(bytes: &[u8]) -> Result<Value> {
        decode(bytes, &mut ValueGuard::unlimited())
    }

    #[test]
    fn test_round_trip() {
        let mut table = Table::new();
        table.insert(Key::Integer(1.into()), Value::Binary(vec![0xde, 0xad]));
        table.insert(Key::Bool(true), canon!([null, 1.5, "x"]));
        table.insert(
            Key::from("date"),
            Value::LocalDate(NaiveDate::from_ymd_opt(1979, 5, 27).unwrap()),
        );
        table.insert(
            Key::from("when"),
            Value::OffsetDateTime(DateTime::parse_from_rfc3339("1979-05-27T00:32:00.5-07:00").unwrap()),
        );
        let doc = Value::Table(table);
        assert_eq!(decode_bytes(&encode(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn test_bignums() {
        for digits in [
            "18446744073709551616",
            "-18446744073709551617",
            "-5",
            "340282366920938463463374607431768211456",
        ] {
            let doc = Value::Integer(digits.parse().unwrap());
            assert_eq!(decode_bytes(&encode(&doc).unwrap()).unwrap(), doc, "{}", digits);
        }
    }

    #[test]
    fn test_epoch_tags() {
        // 1(0) and 100(1)
        let Value::OffsetDateTime(dt) = decode_bytes(&[0xc1, 0x00]).unwrap() else {
            panic!("expected a date-time");
        };
        assert_eq!(dt.timestamp(), 0);

        assert_eq!(
            decode_bytes(&[0xd8, 0x64, 0x01]).unwrap(),
            Value::LocalDate(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap())
        );

        // 1(1.5)
        let Value::OffsetDateTime(dt) = decode_bytes(&[0xc1, 0xf9, 0x3e, 0x00]).unwrap() else {
            panic!("expected a date-time");
        };
        assert_eq!(dt.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_full_date_tag() {
        let mut bytes = vec![0xd9, 0x03, 0xec, 0x6a];
        bytes.extend_from_slice(b"1979-05-27");
        assert_eq!(
            decode_bytes(&bytes).unwrap(),
            Value::LocalDate(NaiveDate::from_ymd_opt(1979, 5, 27).unwrap())
        );
    }

    #[test]
    fn test_local_datetime_rejected() {
        let local = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let doc = canon!([(Value::LocalDateTime(local))]);
        let err = encode(&doc).unwrap_err();
        assert!(matches!(
            err,
            Error::Encode { kind: Some(ValueKind::LocalDateTime), ref path, .. }
                if path.to_string() == "$[0]"
        ));

        let mut table = Table::new();
        table.insert(Key::LocalDateTime(local), Value::Null);
        assert!(encode(&Value::Table(table)).is_err());
    }

    #[test]
    fn test_unknown_tag_is_transparent() {
        // 32("x")
        assert_eq!(decode_bytes(&[0xd8, 0x20, 0x61, b'x']).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let err = decode_bytes(&[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, Error::Decode { position: Position::Offset(1), .. }));
    }

    #[test]
    fn test_local_time_rejected() {
        let doc = canon!([(NaiveTime::from_hms_opt(1, 2, 3).unwrap())]);
        assert!(matches!(
            encode(&doc),
            Err(Error::Encode { kind: Some(ValueKind::LocalTime), .. })
        ));
    }
}
