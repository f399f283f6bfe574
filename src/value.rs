//! Canonical value representation shared by every format.
//!
//! Every decoder normalizes its codec's native tree into a [`Value`] at the
//! boundary, and every encoder starts from one. No other part of the crate
//! ever looks at a format-native type.
//!
//! ## Core Types
//!
//! - [`Value`]: any document node (scalars, dates, binary, arrays, tables)
//! - [`Key`]: the scalar subset allowed as a table key
//! - [`ValueKind`]: the tag of a value or key, used by the loss policy and in errors
//!
//! ## Examples
//!
//! ```rust
//! use remarshal::{Key, Table, Value, ValueKind};
//!
//! let mut table = Table::new();
//! table.insert(Key::from("name"), Value::from("Alice"));
//! table.insert(Key::Bool(true), Value::from(30));
//!
//! let value = Value::Table(table);
//! assert_eq!(value.kind(), ValueKind::Table);
//! assert_eq!(value.as_table().map(|t| t.len()), Some(2));
//! ```

use crate::Table;
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A node of a decoded document.
///
/// Integers keep arbitrary precision and the four date/time kinds stay
/// distinct, so a value survives any conversion whose target can represent
/// it.
///
/// # Examples
///
/// ```rust
/// use remarshal::Value;
///
/// let null = Value::Null;
/// let num = Value::from(42);
/// let text = Value::from("hello");
///
/// assert!(null.is_null());
/// assert!(num.is_integer());
/// assert!(text.is_string());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(BigInt),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    LocalDateTime(NaiveDateTime),
    OffsetDateTime(DateTime<FixedOffset>),
    Array(Vec<Value>),
    Table(Table),
}

/// A table key.
///
/// JSON and TOML only allow string keys, while YAML, CBOR and MessagePack
/// accept any scalar. Floats and binary strings are not valid keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Null,
    Bool(bool),
    Integer(BigInt),
    String(String),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    LocalDateTime(NaiveDateTime),
    OffsetDateTime(DateTime<FixedOffset>),
}

/// The tag of a [`Value`] or [`Key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Binary,
    LocalDate,
    LocalTime,
    LocalDateTime,
    OffsetDateTime,
    Array,
    Table,
}

impl ValueKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Binary => "binary",
            ValueKind::LocalDate => "local date",
            ValueKind::LocalTime => "local time",
            ValueKind::LocalDateTime => "local date-time",
            ValueKind::OffsetDateTime => "offset date-time",
            ValueKind::Array => "array",
            ValueKind::Table => "table",
        }
    }

    /// Returns `true` for the four date/time kinds.
    #[inline]
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            ValueKind::LocalDate
                | ValueKind::LocalTime
                | ValueKind::LocalDateTime
                | ValueKind::OffsetDateTime
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Binary(_) => ValueKind::Binary,
            Value::LocalDate(_) => ValueKind::LocalDate,
            Value::LocalTime(_) => ValueKind::LocalTime,
            Value::LocalDateTime(_) => ValueKind::LocalDateTime,
            Value::OffsetDateTime(_) => ValueKind::OffsetDateTime,
            Value::Array(_) => ValueKind::Array,
            Value::Table(_) => ValueKind::Table,
        }
    }

    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if the value is an integer.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    /// Returns `true` if the value is a string.
    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns `true` if the value is an array.
    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns `true` if the value is a table.
    #[inline]
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remarshal::Value;
    ///
    /// assert_eq!(Value::from("hello").as_str(), Some("hello"));
    /// assert_eq!(Value::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Converts a scalar into a key. Floats, binary strings and containers
    /// have no key form and are handed back unchanged.
    pub fn into_key(self) -> std::result::Result<Key, Value> {
        match self {
            Value::Null => Ok(Key::Null),
            Value::Bool(b) => Ok(Key::Bool(b)),
            Value::Integer(i) => Ok(Key::Integer(i)),
            Value::String(s) => Ok(Key::String(s)),
            Value::LocalDate(d) => Ok(Key::LocalDate(d)),
            Value::LocalTime(t) => Ok(Key::LocalTime(t)),
            Value::LocalDateTime(dt) => Ok(Key::LocalDateTime(dt)),
            Value::OffsetDateTime(dt) => Ok(Key::OffsetDateTime(dt)),
            other => Err(other),
        }
    }

    /// The string this value turns into when stringified, for scalar kinds.
    ///
    /// Floats and containers return `None`: they are never stringified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remarshal::Value;
    ///
    /// assert_eq!(Value::Bool(true).canonical_string().as_deref(), Some("true"));
    /// assert_eq!(Value::Binary(b"hi".to_vec()).canonical_string().as_deref(), Some("aGk="));
    /// ```
    #[must_use]
    pub fn canonical_string(&self) -> Option<String> {
        match self {
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Binary(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            Value::LocalDate(d) => Some(format_date(d)),
            Value::LocalTime(t) => Some(format_time(t)),
            Value::LocalDateTime(dt) => Some(format_local_datetime(dt)),
            Value::OffsetDateTime(dt) => Some(format_offset_datetime(dt)),
            Value::Float(_) | Value::Array(_) | Value::Table(_) => None,
        }
    }

    /// Counts every node of the tree, the root included.
    #[must_use]
    pub fn node_count(&self) -> u64 {
        match self {
            Value::Array(items) => 1 + items.iter().map(Value::node_count).sum::<u64>(),
            Value::Table(table) => 1 + table.values().map(Value::node_count).sum::<u64>(),
            _ => 1,
        }
    }
}

impl Key {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Key::Null => ValueKind::Null,
            Key::Bool(_) => ValueKind::Bool,
            Key::Integer(_) => ValueKind::Integer,
            Key::String(_) => ValueKind::String,
            Key::LocalDate(_) => ValueKind::LocalDate,
            Key::LocalTime(_) => ValueKind::LocalTime,
            Key::LocalDateTime(_) => ValueKind::LocalDateTime,
            Key::OffsetDateTime(_) => ValueKind::OffsetDateTime,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            _ => None,
        }
    }

    /// The string form used when a key is stringified.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        match self {
            Key::Null => "null".to_string(),
            Key::Bool(b) => b.to_string(),
            Key::Integer(i) => i.to_string(),
            Key::String(s) => s.clone(),
            Key::LocalDate(d) => format_date(d),
            Key::LocalTime(t) => format_time(t),
            Key::LocalDateTime(dt) => format_local_datetime(dt),
            Key::OffsetDateTime(dt) => format_offset_datetime(dt),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Key::Null => 0,
            Key::Bool(_) => 1,
            Key::Integer(_) => 2,
            Key::LocalDate(_) => 3,
            Key::LocalTime(_) => 4,
            Key::LocalDateTime(_) => 5,
            Key::OffsetDateTime(_) => 6,
            Key::String(_) => 7,
        }
    }
}

// Keys of different kinds order by kind first; see `order::sort_keys`.
impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Bool(a), Key::Bool(b)) => a.cmp(b),
            (Key::Integer(a), Key::Integer(b)) => a.cmp(b),
            (Key::String(a), Key::String(b)) => a.cmp(b),
            (Key::LocalDate(a), Key::LocalDate(b)) => a.cmp(b),
            (Key::LocalTime(a), Key::LocalTime(b)) => a.cmp(b),
            (Key::LocalDateTime(a), Key::LocalDateTime(b)) => a.cmp(b),
            (Key::OffsetDateTime(a), Key::OffsetDateTime(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

pub(crate) fn format_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub(crate) fn format_time(t: &NaiveTime) -> String {
    t.format("%H:%M:%S%.f").to_string()
}

pub(crate) fn format_local_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

pub(crate) fn format_offset_datetime(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Null => Value::Null,
            Key::Bool(b) => Value::Bool(b),
            Key::Integer(i) => Value::Integer(i),
            Key::String(s) => Value::String(s),
            Key::LocalDate(d) => Value::LocalDate(d),
            Key::LocalTime(t) => Value::LocalTime(t),
            Key::LocalDateTime(dt) => Value::LocalDateTime(dt),
            Key::OffsetDateTime(dt) => Value::OffsetDateTime(dt),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(value)
    }
}

impl From<bool> for Key {
    fn from(value: bool) -> Self {
        Key::Bool(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Integer(BigInt::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(BigInt::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(BigInt::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::LocalDate(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Value::LocalTime(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::LocalDateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Value::OffsetDateTime(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Table> for Value {
    fn from(value: Table) -> Self {
        Value::Table(value)
    }
}
