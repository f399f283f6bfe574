use super::resolve_plain;
use crate::{EncodeOptions, Key, Result, Table, Value, YamlStyle};
use base64::Engine;

/// Characters that may not start a plain scalar.
const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
    '`',
];

/// Longest key, in characters, that may be written as an implicit key.
const MAX_IMPLICIT_KEY: usize = 1024;

/// Writes `value` as a block-style YAML document.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut emitter = Emitter::new(options);
    emitter.root(value);
    Ok(emitter.into_inner().into_bytes())
}

struct Emitter {
    output: String,
    indent: usize,
    style: YamlStyle,
    width: usize,
}

impl Emitter {
    fn new(options: &EncodeOptions) -> Self {
        Emitter {
            output: String::with_capacity(256),
            indent: options.yaml_indent(),
            style: options.yaml_style,
            width: options.width,
        }
    }

    fn into_inner(self) -> String {
        self.output
    }

    fn root(&mut self, value: &Value) {
        match value {
            Value::Table(table) if !table.is_empty() => self.map(table, 0, false),
            Value::Array(items) if !items.is_empty() => self.seq(items, 0, false),
            _ => self.leaf(value, 0),
        }
    }

    fn pad(&mut self, column: usize) {
        self.output.extend(std::iter::repeat(' ').take(column));
    }

    /// `inline_first`: the cursor already sits at `column` after a dash.
    fn map(&mut self, table: &Table, column: usize, inline_first: bool) {
        for (i, (key, value)) in table.iter().enumerate() {
            if i > 0 || !inline_first {
                self.pad(column);
            }
            let start = self.output.len();
            self.key(key);
            if self.output[start..].chars().count() > MAX_IMPLICIT_KEY {
                self.output.insert_str(start, "? ");
                self.output.push('\n');
                self.pad(column);
            }
            self.output.push(':');
            match value {
                Value::Table(t) if !t.is_empty() => {
                    self.output.push('\n');
                    self.map(t, column + self.indent, false);
                }
                // Dashes line up with the parent key.
                Value::Array(items) if !items.is_empty() => {
                    self.output.push('\n');
                    self.seq(items, column, false);
                }
                _ => {
                    self.output.push(' ');
                    self.leaf(value, column);
                }
            }
        }
    }

    fn seq(&mut self, items: &[Value], column: usize, inline_first: bool) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 || !inline_first {
                self.pad(column);
            }
            self.output.push_str("- ");
            match item {
                Value::Table(t) if !t.is_empty() => self.map(t, column + 2, true),
                Value::Array(inner) if !inner.is_empty() => self.seq(inner, column + 2, true),
                _ => self.leaf(item, column),
            }
        }
    }

    fn key(&mut self, key: &Key) {
        match key {
            Key::String(s) => self.flow_string(s, YamlStyle::Plain),
            other => self.output.push_str(&other.canonical_string()),
        }
    }

    /// Writes a scalar or an empty container and ends the line.
    fn leaf(&mut self, value: &Value, column: usize) {
        match value {
            Value::String(s) => return self.string(s, column),
            Value::Float(f) => self.output.push_str(&float(*f)),
            Value::Binary(bytes) => {
                self.output.push_str("!!binary ");
                self.output
                    .push_str(&base64::engine::general_purpose::STANDARD.encode(bytes));
            }
            Value::Array(_) => self.output.push_str("[]"),
            Value::Table(_) => self.output.push_str("{}"),
            scalar => {
                if let Some(text) = scalar.canonical_string() {
                    self.output.push_str(&text);
                }
            }
        }
        self.output.push('\n');
    }

    fn string(&mut self, s: &str, column: usize) {
        let style = self.style;
        match style {
            YamlStyle::Literal if block_ok(s) => self.literal(s, column),
            YamlStyle::Folded if block_ok(s) && foldable(s) => self.folded(s, column),
            YamlStyle::Folded if block_ok(s) => self.literal(s, column),
            YamlStyle::Literal | YamlStyle::Folded => {
                self.double_quoted(s);
                self.output.push('\n');
            }
            style => {
                self.flow_string(s, style);
                self.output.push('\n');
            }
        }
    }

    fn flow_string(&mut self, s: &str, style: YamlStyle) {
        match style {
            YamlStyle::Plain if plain_ok(s) => self.output.push_str(s),
            YamlStyle::Plain | YamlStyle::SingleQuoted if s.chars().all(printable) => {
                self.output.push('\'');
                self.output.push_str(&s.replace('\'', "''"));
                self.output.push('\'');
            }
            _ => self.double_quoted(s),
        }
    }

    fn double_quoted(&mut self, s: &str) {
        self.output.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.output.push_str("\\\""),
                '\\' => self.output.push_str("\\\\"),
                '\n' => self.output.push_str("\\n"),
                '\r' => self.output.push_str("\\r"),
                '\t' => self.output.push_str("\\t"),
                '\0' => self.output.push_str("\\0"),
                '\u{0007}' => self.output.push_str("\\a"),
                '\u{0008}' => self.output.push_str("\\b"),
                '\u{000B}' => self.output.push_str("\\v"),
                '\u{000C}' => self.output.push_str("\\f"),
                '\u{001B}' => self.output.push_str("\\e"),
                '\u{0085}' => self.output.push_str("\\N"),
                '\u{2028}' => self.output.push_str("\\L"),
                '\u{2029}' => self.output.push_str("\\P"),
                c if !printable(c) => {
                    let code = u32::from(c);
                    let escaped = if code <= 0xFF {
                        format!("\\x{:02X}", code)
                    } else if code <= 0xFFFF {
                        format!("\\u{:04X}", code)
                    } else {
                        format!("\\U{:08X}", code)
                    };
                    self.output.push_str(&escaped);
                }
                c => self.output.push(c),
            }
        }
        self.output.push('"');
    }

    fn literal(&mut self, s: &str, column: usize) {
        let (body, newlines) = split_trailing_newlines(s);
        self.output.push('|');
        self.output.push_str(chomping(newlines));
        self.output.push('\n');

        let content = column + self.indent;
        for line in body.split('\n') {
            if !line.is_empty() {
                self.pad(content);
                self.output.push_str(line);
            }
            self.output.push('\n');
        }
        self.trailing_lines(newlines);
    }

    // A single break between two content lines folds into a space, so every
    // source newline becomes one empty line and long lines wrap at spaces.
    fn folded(&mut self, s: &str, column: usize) {
        let (body, newlines) = split_trailing_newlines(s);
        self.output.push('>');
        self.output.push_str(chomping(newlines));
        self.output.push('\n');

        let content = column + self.indent;
        let room = self.width.saturating_sub(content);
        for (i, line) in body.split('\n').enumerate() {
            if i > 0 {
                self.output.push('\n');
            }
            if line.is_empty() {
                continue;
            }
            for piece in wrap(line, room) {
                self.pad(content);
                self.output.push_str(piece);
                self.output.push('\n');
            }
        }
        self.trailing_lines(newlines);
    }

    fn trailing_lines(&mut self, newlines: usize) {
        for _ in 1..newlines {
            self.output.push('\n');
        }
    }
}

fn float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { ".inf" } else { "-.inf" };
        text.to_string()
    } else {
        // Debug output always has a `.` or an exponent, so it reads back as a float.
        format!("{:?}", f)
    }
}

fn printable(c: char) -> bool {
    !c.is_control() && !matches!(c, '\u{FEFF}' | '\u{2028}' | '\u{2029}')
}

/// A plain scalar is safe when it is unambiguous and resolves back to
/// the same string.
fn plain_ok(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(INDICATORS)
        && !s.starts_with(' ')
        && !s.ends_with(' ')
        && !s.starts_with("...")
        && !s.ends_with(':')
        && !s.contains(": ")
        && !s.contains(" #")
        && !s.contains([',', '[', ']', '{', '}'].as_slice())
        && s.chars().all(printable)
        && matches!(resolve_plain(s), Value::String(_))
}

/// Block scalars cannot start with indentation or blank lines, hold
/// control characters, or end in a whitespace-only line.
fn block_ok(s: &str) -> bool {
    let (body, _) = split_trailing_newlines(s);
    !body.is_empty()
        && !body.starts_with([' ', '\t', '\n'].as_slice())
        && body.chars().all(|c| c == '\n' || c == '\t' || printable(c))
        && body
            .rsplit('\n')
            .next()
            .is_some_and(|last| !last.trim().is_empty())
}

/// Lines starting with whitespace would not fold.
fn foldable(s: &str) -> bool {
    s.split('\n')
        .all(|line| !line.starts_with([' ', '\t'].as_slice()))
}

fn split_trailing_newlines(s: &str) -> (&str, usize) {
    let body = s.trim_end_matches('\n');
    (body, s.len() - body.len())
}

fn chomping(newlines: usize) -> &'static str {
    match newlines {
        0 => "-",
        1 => "",
        _ => "+",
    }
}

fn wrap(line: &str, width: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    while let Some(i) = break_point(rest, width) {
        pieces.push(&rest[..i]);
        rest = &rest[i + 1..];
    }
    pieces.push(rest);
    pieces
}

/// Byte index of the space to break at, if `line` is wider than `width`.
/// Only single spaces between two other characters qualify.
fn break_point(line: &str, width: usize) -> Option<usize> {
    if line.chars().count() <= width {
        return None;
    }
    let mut best = None;
    let mut prev = None;
    for (n, (i, c)) in line.char_indices().enumerate() {
        if n > width && best.is_some() {
            break;
        }
        let next = line[i + c.len_utf8()..].chars().next();
        if c == ' ' && prev.is_some_and(|p| p != ' ') && next.is_some_and(|x| x != ' ') {
            best = Some(i);
        }
        prev = Some(c);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::yaml::decode;
    use crate::{canon, ValueGuard};
    use chrono::{DateTime, NaiveDate, NaiveTime};

    fn to_yaml(value: &Value, options: &EncodeOptions) -> String {
        String::from_utf8(encode(value, options).unwrap()).unwrap()
    }

    fn read_back(text: &str) -> Value {
        decode(text.as_bytes(), &mut ValueGuard::unlimited()).unwrap()
    }

    #[test]
    fn test_block_layout() {
        let doc = canon!({"a": [1, {"b": "x", "c": []}], "d": {}, "e": {"f": null}});
        assert_eq!(
            to_yaml(&doc, &EncodeOptions::default()),
            "a:\n- 1\n- b: x\n  c: []\nd: {}\ne:\n  f: null\n"
        );
    }

    #[test]
    fn test_indent_option() {
        let doc = canon!({"a": {"b": [[1, 2]]}});
        assert_eq!(
            to_yaml(&doc, &EncodeOptions::new().with_indent(4)),
            "a:\n    b:\n    - - 1\n      - 2\n"
        );
    }

    #[test]
    fn test_ambiguous_strings_are_quoted() {
        let doc = canon!(["true", "123", "", "a: b", "it's", "x\ny", "plain text", "2024-01-15"]);
        assert_eq!(
            to_yaml(&doc, &EncodeOptions::default()),
            "- 'true'\n- '123'\n- ''\n- 'a: b'\n- it's\n- \"x\\ny\"\n- plain text\n- '2024-01-15'\n"
        );
    }

    #[test]
    fn test_every_kind_round_trips() {
        let mut table = Table::new();
        table.insert(Key::from("null"), Value::Null);
        table.insert(Key::Integer(7.into()), Value::from("seven"));
        table.insert(Key::Bool(false), Value::from(-0.5));
        table.insert(
            Key::from("big"),
            Value::Integer("123456789012345678901234567890".parse().unwrap()),
        );
        table.insert(Key::from("bin"), Value::Binary(vec![0, 159, 146, 150]));
        table.insert(
            Key::from("date"),
            Value::LocalDate(NaiveDate::from_ymd_opt(1979, 5, 27).unwrap()),
        );
        table.insert(
            Key::from("time"),
            Value::LocalTime(NaiveTime::from_hms_milli_opt(7, 32, 0, 250).unwrap()),
        );
        table.insert(
            Key::from("local"),
            Value::LocalDateTime(
                NaiveDate::from_ymd_opt(1979, 5, 27)
                    .unwrap()
                    .and_hms_opt(7, 32, 0)
                    .unwrap(),
            ),
        );
        table.insert(
            Key::from("offset"),
            Value::OffsetDateTime(DateTime::parse_from_rfc3339("1979-05-27T00:32:00-07:00").unwrap()),
        );
        table.insert(Key::from("inf"), Value::Float(f64::INFINITY));
        table.insert(Key::from("tricky"), canon!(["#x", "- y", "~", "0x10", "a #b", "...", "é"]));
        table.insert(Key::from("ctl"), Value::from("bell\u{7}"));
        let doc = Value::Table(table);

        for style in [
            YamlStyle::Plain,
            YamlStyle::SingleQuoted,
            YamlStyle::DoubleQuoted,
            YamlStyle::Literal,
            YamlStyle::Folded,
        ] {
            let text = to_yaml(&doc, &EncodeOptions::new().with_yaml_style(style));
            assert_eq!(read_back(&text), doc, "style {:?}:\n{}", style, text);
        }
    }

    #[test]
    fn test_literal_chomping() {
        let doc = canon!({"a": "line1\nline2\n", "b": "x", "c": "y\n\n"});
        let text = to_yaml(&doc, &EncodeOptions::new().with_yaml_style(YamlStyle::Literal));
        assert_eq!(text, "a: |\n  line1\n  line2\nb: |-\n  x\nc: |+\n  y\n\n");
        assert_eq!(read_back(&text), doc);
    }

    #[test]
    fn test_folded_wraps_at_width() {
        let long = vec!["word"; 30].join(" ");
        let doc = canon!({"a": (format!("{}\nsecond line\n\nthird", long))});
        let options = EncodeOptions::new()
            .with_yaml_style(YamlStyle::Folded)
            .with_width(40);
        let text = to_yaml(&doc, &options);

        assert!(text.starts_with("a: >-\n"));
        assert!(text.lines().all(|line| line.chars().count() <= 40));
        assert_eq!(read_back(&text), doc);
    }

    #[test]
    fn test_block_fallback_to_double_quotes() {
        let doc = canon!([" leading", "tab\u{1}"]);
        let text = to_yaml(&doc, &EncodeOptions::new().with_yaml_style(YamlStyle::Literal));
        assert_eq!(text, "- \" leading\"\n- \"tab\\x01\"\n");
    }

    #[test]
    fn test_long_keys_are_explicit() {
        let long = "k".repeat(1100);
        let mut inner = Table::new();
        inner.insert(Key::from(long.as_str()), canon!([true]));
        let mut table = Table::new();
        table.insert(Key::from(long.as_str()), Value::from(1));
        table.insert(Key::from("short"), Value::Table(inner));
        let doc = Value::Table(table);

        let text = to_yaml(&doc, &EncodeOptions::default());
        assert_eq!(
            text,
            format!("? {}\n: 1\nshort:\n  ? {}\n  :\n  - true\n", long, long)
        );
        assert_eq!(read_back(&text), doc);

        let fits = "k".repeat(1024);
        let mut table = Table::new();
        table.insert(Key::from(fits.as_str()), Value::from(1));
        let text = to_yaml(&Value::Table(table), &EncodeOptions::default());
        assert_eq!(text, format!("{}: 1\n", fits));
    }

    #[test]
    fn test_scalar_root() {
        assert_eq!(to_yaml(&canon!(3.0), &EncodeOptions::default()), "3.0\n");
        assert_eq!(to_yaml(&canon!([]), &EncodeOptions::default()), "[]\n");
        assert_eq!(
            to_yaml(&Value::Float(f64::NEG_INFINITY), &EncodeOptions::default()),
            "-.inf\n"
        );
    }
}
