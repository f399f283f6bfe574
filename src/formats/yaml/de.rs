use super::{parse_float, parse_int, parse_timestamp, resolve_plain};
use crate::{Error, Format, Key, Position, Result, Table, Value, ValueGuard};
use base64::Engine;
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

const CORE_HANDLES: [&str; 2] = ["!!", "tag:yaml.org,2002:"];

/// Decodes the first document of `input`. An empty stream is null.
pub fn decode(input: &[u8], guard: &mut ValueGuard) -> Result<Value> {
    let text = super::super::utf8(input, Format::Yaml)?;
    let mut builder = Builder::new(guard);
    let mut parser = Parser::new(text.chars());
    parser
        .load(&mut builder, false)
        .map_err(|e| Error::decode(Format::Yaml, position(e.marker()), e.info()))?;
    builder.finish()
}

fn position(mark: &Marker) -> Position {
    Position::LineColumn {
        line: mark.line(),
        column: mark.col() + 1,
    }
}

enum Frame {
    Seq {
        items: Vec<Value>,
        anchor: usize,
    },
    Map {
        table: Table,
        key: Option<Key>,
        anchor: usize,
    },
}

/// Builds a [`Value`] from parser events.
///
/// `on_event` cannot fail, so the first error is stored and every event
/// after it is ignored.
struct Builder<'g> {
    guard: &'g mut ValueGuard,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Value>,
    root: Option<Value>,
    error: Option<Error>,
}

impl<'g> Builder<'g> {
    fn new(guard: &'g mut ValueGuard) -> Self {
        Builder {
            guard,
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            error: None,
        }
    }

    fn finish(self) -> Result<Value> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.root.unwrap_or(Value::Null)),
        }
    }

    fn handle(&mut self, ev: Event, mark: Marker) -> Result<()> {
        match ev {
            Event::Scalar(text, style, anchor, tag) => {
                if !self.at_key() {
                    self.guard.tick()?;
                }
                let value = scalar(text, &style, tag.as_ref())
                    .map_err(|msg| Error::decode(Format::Yaml, position(&mark), msg))?;
                self.anchor(anchor, &value);
                self.push(value, mark)
            }
            Event::SequenceStart(anchor, _) => {
                self.guard.tick()?;
                self.stack.push(Frame::Seq {
                    items: Vec::new(),
                    anchor,
                });
                Ok(())
            }
            Event::MappingStart(anchor, _) => {
                self.guard.tick()?;
                self.stack.push(Frame::Map {
                    table: Table::new(),
                    key: None,
                    anchor,
                });
                Ok(())
            }
            Event::SequenceEnd | Event::MappingEnd => {
                let (value, anchor) = match self.stack.pop() {
                    Some(Frame::Seq { items, anchor }) => (Value::Array(items), anchor),
                    Some(Frame::Map { table, anchor, .. }) => (Value::Table(table), anchor),
                    None => {
                        return Err(Error::decode(
                            Format::Yaml,
                            position(&mark),
                            "unbalanced collection end",
                        ))
                    }
                };
                self.anchor(anchor, &value);
                self.push(value, mark)
            }
            Event::Alias(id) => {
                let value = self.anchors.get(&id).cloned().ok_or_else(|| {
                    Error::decode(Format::Yaml, position(&mark), "unknown anchor")
                })?;
                if !self.at_key() {
                    self.guard.charge(value.node_count())?;
                }
                self.push(value, mark)
            }
            _ => Ok(()),
        }
    }

    /// Keys are not values; only what they map to is counted.
    fn at_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Map { key: None, .. }))
    }

    fn anchor(&mut self, id: usize, value: &Value) {
        if id > 0 {
            self.anchors.insert(id, value.clone());
        }
    }

    fn push(&mut self, value: Value, mark: Marker) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_none() {
                    self.root = Some(value);
                }
            }
            Some(Frame::Seq { items, .. }) => items.push(value),
            Some(Frame::Map { table, key, .. }) => match key.take() {
                None => {
                    let k = value.into_key().map_err(|v| {
                        Error::decode(
                            Format::Yaml,
                            position(&mark),
                            format!("{} cannot be a mapping key", v.kind()),
                        )
                    })?;
                    if table.contains_key(&k) {
                        return Err(Error::decode(
                            Format::Yaml,
                            position(&mark),
                            format!("duplicate key {:?}", k.to_string()),
                        ));
                    }
                    *key = Some(k);
                }
                Some(k) => {
                    table.insert(k, value);
                }
            },
        }
        Ok(())
    }
}

impl MarkedEventReceiver for Builder<'_> {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.handle(ev, mark) {
            self.error = Some(e);
        }
    }
}

/// Resolves one scalar from its text, style and tag.
fn scalar(
    text: String,
    style: &TScalarStyle,
    tag: Option<&Tag>,
) -> std::result::Result<Value, String> {
    let core = tag
        .filter(|t| CORE_HANDLES.contains(&t.handle.as_str()))
        .map(|t| t.suffix.as_str());
    let invalid = |what: &str| format!("invalid {} {:?}", what, text);

    match core {
        Some("str") => Ok(Value::String(text)),
        Some("null") => Ok(Value::Null),
        Some("bool") => match resolve_plain(&text) {
            Value::Bool(b) => Ok(Value::Bool(b)),
            _ => Err(invalid("boolean")),
        },
        Some("int") => parse_int(&text).map(Value::Integer).ok_or_else(|| invalid("integer")),
        Some("float") => parse_float(&text)
            .or_else(|| parse_int(&text).and_then(|i| i.to_string().parse().ok()))
            .map(Value::Float)
            .ok_or_else(|| invalid("float")),
        Some("timestamp") => parse_timestamp(&text).ok_or_else(|| invalid("timestamp")),
        Some("binary") => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map(Value::Binary)
                .map_err(|e| format!("invalid binary: {}", e))
        }
        _ if matches!(style, TScalarStyle::Plain) => Ok(resolve_plain(&text)),
        _ => Ok(Value::String(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{canon, ValueKind};

    fn decode_str(s: &str) -> Result<Value> {
        decode(s.as_bytes(), &mut ValueGuard::unlimited())
    }

    #[test]
    fn test_plain_vs_quoted() {
        let doc = decode_str("a: 2024-01-15\nb: '2024-01-15'\nc: \"true\"\nd: true\n").unwrap();
        let table = doc.as_table().unwrap();
        assert_eq!(table.get_str("a").map(Value::kind), Some(ValueKind::LocalDate));
        assert_eq!(table.get_str("b"), Some(&Value::from("2024-01-15")));
        assert_eq!(table.get_str("c"), Some(&Value::from("true")));
        assert_eq!(table.get_str("d"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_block_scalars_are_strings() {
        let doc = decode_str("a: |\n  123\nb: >-\n  null\n").unwrap();
        assert_eq!(doc, canon!({"a": "123\n", "b": "null"}));
    }

    #[test]
    fn test_scalar_keys() {
        let doc = decode_str("1: one\ntrue: yes\nnull: nothing\n").unwrap();
        let keys: Vec<_> = doc.as_table().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![Key::from(1i64), Key::Bool(true), Key::Null]);
    }

    #[test]
    fn test_tags() {
        let doc = decode_str("a: !!str 12\nb: !!float 3\nc: !!binary |\n  aGVs\n  bG8=\n").unwrap();
        let table = doc.as_table().unwrap();
        assert_eq!(table.get_str("a"), Some(&Value::from("12")));
        assert_eq!(table.get_str("b"), Some(&Value::Float(3.0)));
        assert_eq!(table.get_str("c"), Some(&Value::Binary(b"hello".to_vec())));

        assert!(decode_str("a: !!int abc\n").is_err());
    }

    #[test]
    fn test_aliases_expand_and_count() {
        let source = "base: &b [1, 2, 3]\ncopy: *b\n";
        let doc = decode_str(source).unwrap();
        assert_eq!(doc, canon!({"base": [1, 2, 3], "copy": [1, 2, 3]}));

        // root + 4 nodes of the list, then 4 more for the alias
        let mut guard = ValueGuard::new(9);
        assert!(decode(source.as_bytes(), &mut guard).is_ok());
        assert_eq!(guard.count(), 9);

        let mut guard = ValueGuard::new(8);
        assert!(matches!(
            decode(source.as_bytes(), &mut guard),
            Err(Error::ResourceLimit { limit: 8 })
        ));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = decode_str("a: 1\nb: 2\na: 3\n").unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }

    #[test]
    fn test_empty_input_is_null() {
        assert_eq!(decode_str("").unwrap(), Value::Null);
        assert_eq!(decode_str("# only a comment\n").unwrap(), Value::Null);
    }

    #[test]
    fn test_only_first_document() {
        assert_eq!(decode_str("--- 1\n--- 2\n").unwrap(), Value::from(1));
    }

    #[test]
    fn test_syntax_error_position() {
        let err = decode_str("a: [1, 2\nb: 3\n").unwrap_err();
        assert!(matches!(err, Error::Decode { position: Position::LineColumn { .. }, .. }));
    }
}
