//! MessagePack adapter (`rmpv`).
//!
//! Date/time kinds travel as the timestamp extension (type -1), which has
//! no notion of a calendar date or an offset: local dates become midnight
//! UTC and offsets are normalized to UTC. Local times and local date-times
//! are never written. Everything read back from a timestamp is an offset
//! date-time.

use crate::{Error, Format, Key, Path, Position, Result, Table, Value, ValueGuard};
use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use rmpv::Value as Msgpack;

const TIMESTAMP_EXT: i8 = -1;

/// Same nesting limit as the CBOR decoder.
const MAX_DEPTH: usize = 256;

pub fn decode(input: &[u8], guard: &mut ValueGuard) -> Result<Value> {
    let mut reader = input;
    let native = rmpv::decode::read_value_with_max_depth(&mut reader, MAX_DEPTH).map_err(|e| {
        Error::decode(
            Format::Msgpack,
            Position::Offset(input.len() - reader.len()),
            e,
        )
    })?;
    if !reader.is_empty() {
        return Err(Error::decode(
            Format::Msgpack,
            Position::Offset(input.len() - reader.len()),
            "trailing data after the first value",
        ));
    }
    normalize(native, guard)
}

fn invalid<T: std::fmt::Display>(msg: T) -> Error {
    Error::decode(Format::Msgpack, Position::Unknown, msg)
}

fn normalize(native: Msgpack, guard: &mut ValueGuard) -> Result<Value> {
    guard.tick()?;
    Ok(match native {
        Msgpack::Nil => Value::Null,
        Msgpack::Boolean(b) => Value::Bool(b),
        Msgpack::Integer(i) => match (i.as_i64(), i.as_u64()) {
            (Some(n), _) => Value::from(n),
            (None, Some(n)) => Value::from(n),
            (None, None) => return Err(invalid("integer out of range")),
        },
        Msgpack::F32(f) => Value::Float(f64::from(f)),
        Msgpack::F64(f) => Value::Float(f),
        Msgpack::String(s) => Value::String(
            s.into_str()
                .ok_or_else(|| invalid("string is not valid UTF-8"))?,
        ),
        Msgpack::Binary(bytes) => Value::Binary(bytes),
        Msgpack::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(normalize(item, guard)?);
            }
            Value::Array(out)
        }
        Msgpack::Map(entries) => {
            let mut table = Table::with_capacity(entries.len());
            for (k, v) in entries {
                table.insert(key(k)?, normalize(v, guard)?);
            }
            Value::Table(table)
        }
        Msgpack::Ext(TIMESTAMP_EXT, data) => Value::OffsetDateTime(timestamp(&data)?),
        Msgpack::Ext(ty, _) => return Err(invalid(format!("unsupported extension type {}", ty))),
    })
}

/// Map keys are not counted as values.
fn key(native: Msgpack) -> Result<Key> {
    normalize(native, &mut ValueGuard::unlimited())?
        .into_key()
        .map_err(|k| invalid(format!("{} cannot be a map key", k.kind())))
}

fn timestamp(data: &[u8]) -> Result<DateTime<FixedOffset>> {
    let (secs, nanos) = match data.len() {
        4 => {
            let secs = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
            (i64::from(secs), 0)
        }
        8 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(data);
            let packed = u64::from_be_bytes(raw);
            ((packed & 0x3_ffff_ffff) as i64, (packed >> 34) as u32)
        }
        12 => {
            let nanos = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&data[4..]);
            (i64::from_be_bytes(raw), nanos)
        }
        n => return Err(invalid(format!("timestamp of {} bytes", n))),
    };
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| dt.with_timezone(&Utc.fix()))
        .ok_or_else(|| invalid("timestamp out of range"))
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let native = to_native(value, &mut Path::root())?;
    let mut out = Vec::with_capacity(128);
    rmpv::encode::write_value(&mut out, &native)
        .map_err(|e| Error::encode(Format::Msgpack, None, &Path::root(), e))?;
    Ok(out)
}

fn to_native(value: &Value, path: &mut Path) -> Result<Msgpack> {
    let fail = |path: &Path, msg: String| {
        Error::encode(Format::Msgpack, Some(value.kind()), path, msg)
    };

    Ok(match value {
        Value::Null => Msgpack::Nil,
        Value::Bool(b) => Msgpack::Boolean(*b),
        Value::Integer(i) => integer(i)
            .ok_or_else(|| fail(path, format!("integer {} does not fit in 64 bits", i)))?,
        Value::Float(f) => Msgpack::F64(*f),
        Value::String(s) => Msgpack::String(s.as_str().into()),
        Value::Binary(bytes) => Msgpack::Binary(bytes.clone()),
        Value::LocalDate(d) => ext_timestamp(&Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN))),
        Value::OffsetDateTime(dt) => ext_timestamp(dt),
        Value::LocalTime(_) | Value::LocalDateTime(_) => {
            return Err(fail(path, format!("{} values are not supported", value.kind())))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push_index(i);
                out.push(to_native(item, path)?);
                path.pop();
            }
            Msgpack::Array(out)
        }
        Value::Table(table) => {
            let mut entries = Vec::with_capacity(table.len());
            for (k, v) in table {
                if let Key::LocalTime(_) | Key::LocalDateTime(_) = k {
                    return Err(super::key_error(Format::Msgpack, k, path));
                }
                let key = to_native(&Value::from(k.clone()), path)?;
                path.push_key(k.clone());
                entries.push((key, to_native(v, path)?));
                path.pop();
            }
            Msgpack::Map(entries)
        }
    })
}

fn integer(i: &BigInt) -> Option<Msgpack> {
    i.to_i64()
        .map(Msgpack::from)
        .or_else(|| i.to_u64().map(Msgpack::from))
}

/// Picks the smallest timestamp form that holds the instant.
fn ext_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> Msgpack {
    let secs = dt.timestamp();
    let nanos = dt.timestamp_subsec_nanos();
    let data = if nanos == 0 && (0..1 << 32).contains(&secs) {
        (secs as u32).to_be_bytes().to_vec()
    } else if (0..1 << 34).contains(&secs) {
        ((u64::from(nanos) << 34) | secs as u64).to_be_bytes().to_vec()
    } else {
        let mut data = nanos.to_be_bytes().to_vec();
        data.extend_from_slice(&secs.to_be_bytes());
        data
    };
    Msgpack::Ext(TIMESTAMP_EXT, data)
}
