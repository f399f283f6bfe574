//! Ordered table type.
//!
//! [`Table`] wraps an [`IndexMap`] so that entries keep the order in which a
//! decoder saw them. Reordering only happens through [`Table::sort_keys`].
//!
//! ## Examples
//!
//! ```rust
//! use remarshal::{Key, Table, Value};
//!
//! let mut table = Table::new();
//! table.insert(Key::from("b"), Value::from(1));
//! table.insert(Key::from("a"), Value::from(2));
//!
//! let keys: Vec<_> = table.keys().map(|k| k.to_string()).collect();
//! assert_eq!(keys, ["b", "a"]);
//! assert_eq!(table.get_str("a"), Some(&Value::from(2)));
//! ```

use crate::{Key, Value};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table(IndexMap<Key, Value>);

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Table(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Table(IndexMap::with_capacity(capacity))
    }

    /// Inserts an entry. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.0.get(&Key::String(key.to_string()))
    }

    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.0.contains_key(key)
    }

    /// Removes an entry, shifting later entries so the order of the rest is kept.
    pub fn shift_remove(&mut self, key: &Key) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, Key, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, Key, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.0.iter()
    }

    /// Stable sort of the entries by [`Key`] order.
    pub fn sort_keys(&mut self) {
        self.0.sort_by(|k1, _, k2, _| k1.cmp(k2));
    }
}

impl IntoIterator for Table {
    type Item = (Key, Value);
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Key, Value)> for Table {
    fn from_iter<T: IntoIterator<Item = (Key, Value)>>(iter: T) -> Self {
        Table(IndexMap::from_iter(iter))
    }
}
