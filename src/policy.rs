//! Loss and compatibility policy.
//!
//! A static table says, for every value or key kind and every target format,
//! whether the kind is written natively ([`Compat::Direct`]), only as its
//! canonical string when stringify is enabled ([`Compat::StringifyOnly`]), or
//! never ([`Compat::Unsupported`]).
//!
//! [`check_loss`] walks the whole tree once before encoding. The first node
//! that cannot pass aborts the conversion, so no output is produced for a
//! document that would lose data.
//!
//! | kind             | JSON      | TOML        | YAML   | CBOR        | MessagePack | Python |
//! |------------------|-----------|-------------|--------|-------------|-------------|--------|
//! | null             | direct    | stringify   | direct | direct      | direct      | direct |
//! | binary           | stringify | stringify   | direct | direct      | direct      | direct |
//! | date, offset dt  | stringify | direct      | direct | direct      | direct      | direct |
//! | local date-time  | stringify | direct      | direct | unsupported | unsupported | direct |
//! | local time       | stringify | unsupported | direct | unsupported | unsupported | direct |
//! | non-string key   | stringify | stringify   | direct | direct      | direct      | direct |
//!
//! Every other kind is direct everywhere. Neither CBOR nor MessagePack has a
//! date-time without an offset, so a local one has nowhere to go. Keys follow
//! the values in those two formats: local time and local date-time keys are
//! unsupported. JSON and TOML stringify every non-string key, local times
//! included.

use crate::error::Subject;
use crate::{Error, Format, Key, Path, Result, Table, Value, ValueKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compat {
    Direct,
    StringifyOnly,
    Unsupported,
}

/// Compatibility of a value kind with a target format.
#[must_use]
pub fn value_compat(kind: ValueKind, format: Format) -> Compat {
    use Compat::*;

    match (format, kind) {
        (Format::Yaml | Format::Python, _) => Direct,
        (_, ValueKind::LocalTime) if format != Format::Json => Unsupported,
        (Format::Cbor | Format::Msgpack, ValueKind::LocalDateTime) => Unsupported,
        (Format::Json, k) if k.is_temporal() || k == ValueKind::Binary => StringifyOnly,
        (Format::Toml, ValueKind::Null | ValueKind::Binary) => StringifyOnly,
        _ => Direct,
    }
}

/// Compatibility of a key kind with a target format.
#[must_use]
pub fn key_compat(kind: ValueKind, format: Format) -> Compat {
    match (format, kind) {
        (_, ValueKind::String) => Compat::Direct,
        (Format::Json | Format::Toml, _) => Compat::StringifyOnly,
        (Format::Cbor | Format::Msgpack, ValueKind::LocalTime | ValueKind::LocalDateTime) => {
            Compat::Unsupported
        }
        _ => Compat::Direct,
    }
}

/// Validates `value` against `format`, stringifying nodes where allowed.
///
/// Returns a new tree in which every `StringifyOnly` node has been replaced
/// by its canonical string (only possible with `stringify`).
///
/// # Examples
///
/// ```rust
/// use remarshal::{check_loss, Error, Format, Key, Table, Value};
///
/// let mut table = Table::new();
/// table.insert(Key::Bool(true), Value::from(1));
/// let doc = Value::Table(table);
///
/// assert!(matches!(check_loss(doc.clone(), Format::Json, false), Err(Error::Loss { .. })));
///
/// let fixed = check_loss(doc, Format::Json, true).unwrap();
/// assert_eq!(fixed.as_table().unwrap().get_str("true"), Some(&Value::from(1)));
/// ```
pub fn check_loss(value: Value, format: Format, stringify: bool) -> Result<Value> {
    let mut path = Path::root();
    Checker { format, stringify }.value(value, &mut path)
}

struct Checker {
    format: Format,
    stringify: bool,
}

impl Checker {
    fn value(&self, value: Value, path: &mut Path) -> Result<Value> {
        match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    path.push_index(i);
                    out.push(self.value(item, path)?);
                    path.pop();
                }
                Ok(Value::Array(out))
            }
            Value::Table(table) => self.table(table, path).map(Value::Table),
            scalar => {
                let kind = scalar.kind();
                match value_compat(kind, self.format) {
                    Compat::Direct => Ok(scalar),
                    Compat::StringifyOnly if self.stringify => {
                        let text = scalar.canonical_string().ok_or_else(|| {
                            Error::encode(self.format, Some(kind), path, "no string form")
                        })?;
                        Ok(Value::String(text))
                    }
                    Compat::StringifyOnly => Err(Error::loss(Subject::Value, kind, self.format, path)),
                    Compat::Unsupported => Err(Error::encode(
                        self.format,
                        Some(kind),
                        path,
                        format!("{} values are not supported", kind),
                    )),
                }
            }
        }
    }

    fn table(&self, table: Table, path: &mut Path) -> Result<Table> {
        let mut out = Table::with_capacity(table.len());
        for (key, value) in table {
            let key = self.key(key, path)?;
            path.push_key(key.clone());
            let value = self.value(value, path)?;
            path.pop();
            if out.contains_key(&key) {
                return Err(Error::encode(
                    self.format,
                    Some(ValueKind::String),
                    path,
                    format!("stringified key {:?} collides with an existing key", key.to_string()),
                ));
            }
            out.insert(key, value);
        }
        Ok(out)
    }

    fn key(&self, key: Key, path: &Path) -> Result<Key> {
        let kind = key.kind();
        match key_compat(kind, self.format) {
            Compat::Direct => Ok(key),
            Compat::StringifyOnly if self.stringify => Ok(Key::String(key.canonical_string())),
            Compat::StringifyOnly => Err(Error::loss(Subject::Key, kind, self.format, path)),
            Compat::Unsupported => Err(Error::encode(
                self.format,
                Some(kind),
                path,
                format!("{} keys are not supported", kind),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon;
    use chrono::{NaiveDate, NaiveTime};

    fn date() -> Value {
        Value::LocalDate(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    }

    fn time() -> Value {
        Value::LocalTime(NaiveTime::from_hms_opt(7, 32, 0).unwrap())
    }

    #[test]
    fn test_matrix_spot_checks() {
        assert_eq!(value_compat(ValueKind::LocalTime, Format::Toml), Compat::Unsupported);
        assert_eq!(value_compat(ValueKind::LocalTime, Format::Cbor), Compat::Unsupported);
        assert_eq!(value_compat(ValueKind::LocalTime, Format::Msgpack), Compat::Unsupported);
        assert_eq!(value_compat(ValueKind::LocalTime, Format::Json), Compat::StringifyOnly);
        assert_eq!(value_compat(ValueKind::LocalTime, Format::Yaml), Compat::Direct);
        assert_eq!(value_compat(ValueKind::Binary, Format::Json), Compat::StringifyOnly);
        assert_eq!(value_compat(ValueKind::Null, Format::Toml), Compat::StringifyOnly);
        assert_eq!(value_compat(ValueKind::Null, Format::Json), Compat::Direct);
        assert_eq!(value_compat(ValueKind::Integer, Format::Json), Compat::Direct);
        assert_eq!(value_compat(ValueKind::LocalDate, Format::Toml), Compat::Direct);
        assert_eq!(key_compat(ValueKind::Bool, Format::Json), Compat::StringifyOnly);
        assert_eq!(key_compat(ValueKind::Integer, Format::Toml), Compat::StringifyOnly);
        assert_eq!(key_compat(ValueKind::Bool, Format::Cbor), Compat::Direct);
        assert_eq!(key_compat(ValueKind::LocalTime, Format::Msgpack), Compat::Unsupported);
        assert_eq!(key_compat(ValueKind::LocalTime, Format::Toml), Compat::StringifyOnly);
    }

    #[test]
    fn test_local_datetime_needs_an_offset_in_binary_formats() {
        let local = NaiveDate::from_ymd_opt(1979, 5, 27)
            .unwrap()
            .and_hms_opt(7, 32, 0)
            .unwrap();
        for format in [Format::Cbor, Format::Msgpack] {
            assert_eq!(value_compat(ValueKind::LocalDateTime, format), Compat::Unsupported);
            assert_eq!(key_compat(ValueKind::LocalDateTime, format), Compat::Unsupported);

            let doc = canon!({"when": (Value::LocalDateTime(local))});
            let err = check_loss(doc, format, true).unwrap_err();
            assert!(matches!(
                err,
                Error::Encode { kind: Some(ValueKind::LocalDateTime), ref path, .. }
                    if path.to_string() == "$.when"
            ));

            let mut table = Table::new();
            table.insert(Key::LocalDateTime(local), Value::from(1));
            assert!(check_loss(Value::Table(table), format, true).is_err());
        }
        assert_eq!(value_compat(ValueKind::LocalDateTime, Format::Toml), Compat::Direct);
        assert_eq!(value_compat(ValueKind::LocalDate, Format::Msgpack), Compat::Direct);
    }

    #[test]
    fn test_dates_to_json_need_stringify() {
        let doc = Value::Array(vec![date()]);
        let err = check_loss(doc.clone(), Format::Json, false).unwrap_err();
        match err {
            Error::Loss { subject, kind, path, .. } => {
                assert_eq!(subject, Subject::Value);
                assert_eq!(kind, ValueKind::LocalDate);
                assert_eq!(path.to_string(), "$[0]");
            }
            other => panic!("unexpected {:?}", other),
        }

        let fixed = check_loss(doc, Format::Json, true).unwrap();
        assert_eq!(fixed, canon!(["2024-01-15"]));
    }

    #[test]
    fn test_local_time_to_toml_fails_even_with_stringify() {
        let mut table = Table::new();
        table.insert(Key::from("at"), time());
        let err = check_loss(Value::Table(table), Format::Toml, true).unwrap_err();
        assert!(matches!(
            err,
            Error::Encode { kind: Some(ValueKind::LocalTime), .. }
        ));
    }

    #[test]
    fn test_toml_null_stringified() {
        let doc = canon!({"a": null});
        assert!(check_loss(doc.clone(), Format::Toml, false).is_err());
        assert_eq!(
            check_loss(doc, Format::Toml, true).unwrap(),
            canon!({"a": "null"})
        );
    }

    #[test]
    fn test_stringified_key_collision() {
        let mut table = Table::new();
        table.insert(Key::Bool(true), Value::from(1));
        table.insert(Key::from("true"), Value::from(2));
        let err = check_loss(Value::Table(table), Format::Json, true).unwrap_err();
        assert!(err.to_string().contains("collides"));
    }

    #[test]
    fn test_yaml_accepts_everything() {
        let mut table = Table::new();
        table.insert(Key::Null, Value::Binary(vec![0, 1]));
        table.insert(Key::from("t"), time());
        let doc = Value::Table(table);
        assert_eq!(check_loss(doc.clone(), Format::Yaml, false).unwrap(), doc);
    }
}
