//! JSON adapter (`serde_json` with arbitrary precision numbers).
//!
//! Number literals keep their exact text: one without a fraction or
//! exponent becomes an [`Value::Integer`] of any size, everything else a
//! float. On the way out, integers that do not fit a machine word are
//! written as their exact digits.

use super::utf8;
use crate::{EncodeOptions, Error, Format, Key, Path, Position, Result, Value, ValueGuard};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::Serialize;
use serde_json::ser::{CompactFormatter, PrettyFormatter};

pub fn decode(input: &[u8], guard: &mut ValueGuard) -> Result<Value> {
    let text = utf8(input, Format::Json)?;
    let native: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        Error::decode(
            Format::Json,
            Position::LineColumn {
                line: e.line(),
                column: e.column(),
            },
            e,
        )
    })?;
    normalize(native, guard)
}

fn normalize(native: serde_json::Value, guard: &mut ValueGuard) -> Result<Value> {
    guard.tick()?;
    Ok(match native {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => number(&n)?,
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(normalize(item, guard)?);
            }
            Value::Array(out)
        }
        serde_json::Value::Object(map) => {
            let mut table = crate::Table::with_capacity(map.len());
            for (k, v) in map {
                let v = normalize(v, guard)?;
                table.insert(Key::String(k), v);
            }
            Value::Table(table)
        }
    })
}

fn number(n: &serde_json::Number) -> Result<Value> {
    let literal = n.to_string();
    let invalid = |what: &str| {
        Error::decode(
            Format::Json,
            Position::Unknown,
            format!("invalid {} literal {}", what, literal),
        )
    };
    if literal.contains(&['.', 'e', 'E'][..]) {
        literal
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid("float"))
    } else {
        literal
            .parse::<BigInt>()
            .map(Value::Integer)
            .map_err(|_| invalid("integer"))
    }
}

pub fn encode(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>> {
    let native = to_native(value, &mut Path::root())?;

    let mut out = Vec::with_capacity(128);
    let written = match options.indent {
        None => {
            let mut ser = serde_json::Serializer::with_formatter(&mut out, CompactFormatter);
            native.serialize(&mut ser)
        }
        Some(indent) => {
            let spaces = " ".repeat(indent);
            let formatter = PrettyFormatter::with_indent(spaces.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
            native.serialize(&mut ser)
        }
    };
    written.map_err(|e| Error::encode(Format::Json, None, &Path::root(), e))?;
    out.push(b'\n');
    Ok(out)
}

fn to_native(value: &Value, path: &mut Path) -> Result<serde_json::Value> {
    let unsupported = |path: &Path, msg: &str| {
        Error::encode(Format::Json, Some(value.kind()), path, msg)
    };

    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::Number(integer(i, path)?),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| unsupported(path, "non-finite floats are not supported"))?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push_index(i);
                out.push(to_native(item, path)?);
                path.pop();
            }
            serde_json::Value::Array(out)
        }
        Value::Table(table) => {
            let mut map = serde_json::Map::with_capacity(table.len());
            for (k, v) in table {
                let Key::String(name) = k else {
                    return Err(super::key_error(Format::Json, k, path));
                };
                path.push_key(k.clone());
                map.insert(name.clone(), to_native(v, path)?);
                path.pop();
            }
            serde_json::Value::Object(map)
        }
        other => {
            return Err(unsupported(
                path,
                &format!("{} values need stringify", other.kind()),
            ))
        }
    })
}

fn integer(i: &BigInt, path: &Path) -> Result<serde_json::Number> {
    if let Some(small) = i.to_i64() {
        return Ok(serde_json::Number::from(small));
    }
    if let Some(small) = i.to_u64() {
        return Ok(serde_json::Number::from(small));
    }
    i.to_string()
        .parse::<serde_json::Number>()
        .map_err(|e| Error::encode(Format::Json, Some(crate::ValueKind::Integer), path, e))
}
