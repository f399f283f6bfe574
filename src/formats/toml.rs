//! TOML adapter (`toml` with order-preserving tables).
//!
//! TOML datetimes map onto the four date/time kinds by which parts are
//! present. The root must be a table and every key a string; integers are
//! limited to 64 bits and local times are never written.

use super::utf8;
use crate::value::format_offset_datetime;
use crate::{Error, Format, Key, Path, Position, Result, Table, Value, ValueGuard};
use ::toml::value::{Date, Datetime, Time};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

pub fn decode(input: &[u8], guard: &mut ValueGuard) -> Result<Value> {
    let text = utf8(input, Format::Toml)?;
    let native: ::toml::Table = ::toml::from_str(text).map_err(|e| {
        let position = e
            .span()
            .map(|span| line_column(text, span.start))
            .unwrap_or(Position::Unknown);
        Error::decode(Format::Toml, position, e.message())
    })?;
    guard.tick()?;
    normalize_table(native, guard).map(Value::Table)
}

fn line_column(text: &str, offset: usize) -> Position {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    Position::LineColumn { line, column }
}

fn normalize_table(table: ::toml::Table, guard: &mut ValueGuard) -> Result<Table> {
    let mut out = Table::with_capacity(table.len());
    for (k, v) in table {
        let v = normalize(v, guard)?;
        out.insert(Key::String(k), v);
    }
    Ok(out)
}

fn normalize(native: ::toml::Value, guard: &mut ValueGuard) -> Result<Value> {
    guard.tick()?;
    Ok(match native {
        ::toml::Value::String(s) => Value::String(s),
        ::toml::Value::Integer(i) => Value::Integer(BigInt::from(i)),
        ::toml::Value::Float(f) => Value::Float(f),
        ::toml::Value::Boolean(b) => Value::Bool(b),
        ::toml::Value::Datetime(dt) => datetime(&dt)?,
        ::toml::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(normalize(item, guard)?);
            }
            Value::Array(out)
        }
        ::toml::Value::Table(table) => Value::Table(normalize_table(table, guard)?),
    })
}

fn datetime(dt: &Datetime) -> Result<Value> {
    let invalid = || {
        Error::decode(
            Format::Toml,
            Position::Unknown,
            format!("datetime {} is out of range", dt),
        )
    };
    let date = dt
        .date
        .map(|d| NaiveDate::from_ymd_opt(i32::from(d.year), u32::from(d.month), u32::from(d.day)))
        .map(|d| d.ok_or_else(invalid))
        .transpose()?;
    let time = dt
        .time
        .map(|t| {
            NaiveTime::from_hms_nano_opt(
                u32::from(t.hour),
                u32::from(t.minute),
                u32::from(t.second),
                t.nanosecond,
            )
        })
        .map(|t| t.ok_or_else(invalid))
        .transpose()?;

    match (date, time, dt.offset.is_some()) {
        (Some(_), Some(_), true) => DateTime::parse_from_rfc3339(&dt.to_string())
            .map(Value::OffsetDateTime)
            .map_err(|e| Error::decode(Format::Toml, Position::Unknown, e)),
        (Some(d), Some(t), false) => Ok(Value::LocalDateTime(d.and_time(t))),
        (Some(d), None, _) => Ok(Value::LocalDate(d)),
        (None, Some(t), _) => Ok(Value::LocalTime(t)),
        (None, None, _) => Err(invalid()),
    }
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut path = Path::root();
    let Value::Table(table) = value else {
        return Err(Error::encode(
            Format::Toml,
            Some(value.kind()),
            &path,
            format!(
                "root not a table ({}); use a wrap key to put it in a table",
                value.kind()
            ),
        ));
    };
    let native = to_native_table(table, &mut path)?;
    let text = ::toml::to_string(&native)
        .map_err(|e| Error::encode(Format::Toml, None, &Path::root(), e))?;
    Ok(text.into_bytes())
}

fn to_native_table(table: &Table, path: &mut Path) -> Result<::toml::Table> {
    let mut out = ::toml::Table::with_capacity(table.len());
    for (k, v) in table {
        let Key::String(name) = k else {
            return Err(super::key_error(Format::Toml, k, path));
        };
        path.push_key(k.clone());
        out.insert(name.clone(), to_native(v, path)?);
        path.pop();
    }
    Ok(out)
}

fn to_native(value: &Value, path: &mut Path) -> Result<::toml::Value> {
    let fail = |path: &Path, msg: String| Error::encode(Format::Toml, Some(value.kind()), path, msg);

    Ok(match value {
        Value::Bool(b) => ::toml::Value::Boolean(*b),
        Value::Integer(i) => ::toml::Value::Integer(
            i.to_i64()
                .ok_or_else(|| fail(path, format!("integer {} does not fit in 64 bits", i)))?,
        ),
        Value::Float(f) => ::toml::Value::Float(*f),
        Value::String(s) => ::toml::Value::String(s.clone()),
        Value::LocalDate(d) => ::toml::Value::Datetime(Datetime {
            date: Some(date(d).ok_or_else(|| fail(path, format!("year of {} out of range", d)))?),
            time: None,
            offset: None,
        }),
        Value::LocalDateTime(dt) => ::toml::Value::Datetime(Datetime {
            date: Some(
                date(&dt.date()).ok_or_else(|| fail(path, format!("year of {} out of range", dt)))?,
            ),
            time: Some(time(&dt.time())),
            offset: None,
        }),
        Value::OffsetDateTime(dt) => {
            let text = format_offset_datetime(dt);
            ::toml::Value::Datetime(
                text.parse::<Datetime>()
                    .map_err(|e| fail(path, format!("{}: {}", text, e)))?,
            )
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push_index(i);
                out.push(to_native(item, path)?);
                path.pop();
            }
            ::toml::Value::Array(out)
        }
        Value::Table(table) => ::toml::Value::Table(to_native_table(table, path)?),
        Value::Null | Value::Binary(_) | Value::LocalTime(_) => {
            return Err(fail(path, format!("{} values are not supported", value.kind())))
        }
    })
}

fn date(d: &NaiveDate) -> Option<Date> {
    let year = u16::try_from(d.year()).ok().filter(|y| *y <= 9999)?;
    Some(Date {
        year,
        month: d.month() as u8,
        day: d.day() as u8,
    })
}

fn time(t: &NaiveTime) -> Time {
    Time {
        hour: t.hour() as u8,
        minute: t.minute() as u8,
        second: t.second() as u8,
        nanosecond: t.nanosecond(),
    }
}
