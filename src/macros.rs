/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// Object keys are string literals; any other leaf goes through
/// `Value::from`.
///
/// ```rust
/// use remarshal::{canon, Value};
///
/// let doc = canon!({
///     "name": "Alice",
///     "tags": ["a", "b"],
///     "admin": false,
///     "manager": null
/// });
/// assert_eq!(doc.as_table().unwrap().len(), 4);
/// ```
#[macro_export]
macro_rules! canon {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::canon!($elem)),*])
    };

    ({}) => {
        $crate::Value::Table($crate::Table::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut table = $crate::Table::new();
        $(
            table.insert($crate::Key::from($key), $crate::canon!($value));
        )*
        $crate::Value::Table(table)
    }};

    ($e:expr) => {
        $crate::Value::from($e)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Key, Table, Value};

    #[test]
    fn test_canon_macro_primitives() {
        assert_eq!(canon!(null), Value::Null);
        assert_eq!(canon!(true), Value::Bool(true));
        assert_eq!(canon!(42), Value::from(42));
        assert_eq!(canon!(3.5), Value::Float(3.5));
        assert_eq!(canon!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn test_canon_macro_nested() {
        assert_eq!(canon!({}), Value::Table(Table::new()));

        let doc = canon!({"c": [1, 2, 3], "d": {"e": null}});
        let table = doc.as_table().unwrap();
        assert_eq!(
            table.get(&Key::from("c")),
            Some(&Value::Array(vec![Value::from(1), Value::from(2), Value::from(3)]))
        );
        assert_eq!(
            table.get_str("d").and_then(Value::as_table).and_then(|t| t.get_str("e")),
            Some(&Value::Null)
        );
    }
}
