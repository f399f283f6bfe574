//! Root-shape adapters.
//!
//! [`wrap`] puts a document under a single synthetic key so that roots which
//! are not tables can pass through table-only formats such as TOML.
//! [`unwrap`] takes it back out.
//!
//! ```rust
//! use remarshal::{transform, Value};
//!
//! let doc = Value::Array(vec![Value::from(1), Value::from(2)]);
//! let wrapped = transform::wrap(doc.clone(), "data");
//! assert!(wrapped.is_table());
//! assert_eq!(transform::unwrap(wrapped, "data").unwrap(), doc);
//! ```

use crate::{Error, Key, Result, Table, Value};

/// Returns `{key: value}`.
#[must_use]
pub fn wrap(value: Value, key: &str) -> Value {
    let mut table = Table::with_capacity(1);
    table.insert(Key::from(key), value);
    Value::Table(table)
}

/// Returns the value stored under `key` in a table root.
pub fn unwrap(value: Value, key: &str) -> Result<Value> {
    match value {
        Value::Table(mut table) => table
            .shift_remove(&Key::from(key))
            .ok_or_else(|| Error::unwrap_failure(key, "key not found in top-level table")),
        other => Err(Error::unwrap_failure(
            key,
            format!("top-level value is {}, not a table", other.kind()),
        )),
    }
}

/// Applies `unwrap` first and then `wrap`, each only when given.
pub fn apply(value: Value, wrap_key: Option<&str>, unwrap_key: Option<&str>) -> Result<Value> {
    let value = match unwrap_key {
        Some(key) => unwrap(value, key)?,
        None => value,
    };
    Ok(match wrap_key {
        Some(key) => wrap(value, key),
        None => value,
    })
}
