//! Key ordering.
//!
//! Tables keep first-seen order end to end. [`sort_keys`] is the only pass
//! that changes it: every table, at every depth, is stably sorted by the
//! total order on [`Key`](crate::Key). Arrays keep their element order.

use crate::Value;

/// Returns a copy of `value` with every table sorted by key.
///
/// ```rust
/// use remarshal::{order, Key, Table, Value};
///
/// let table: Table = vec![
///     (Key::from("b"), Value::from(1)),
///     (Key::from("a"), Value::from(2)),
/// ]
/// .into_iter()
/// .collect();
///
/// let sorted = order::sort_keys(&Value::Table(table));
/// let keys: Vec<_> = sorted.as_table().unwrap().keys().map(|k| k.to_string()).collect();
/// assert_eq!(keys, ["a", "b"]);
/// ```
#[must_use]
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        Value::Table(table) => {
            let mut sorted: crate::Table = table
                .iter()
                .map(|(k, v)| (k.clone(), sort_keys(v)))
                .collect();
            sorted.sort_keys();
            Value::Table(sorted)
        }
        scalar => scalar.clone(),
    }
}
