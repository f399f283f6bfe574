//! Python literal output.
//!
//! Writes what `repr` would print for the equivalent Python object, so the
//! output can be pasted into a Python shell. With an indent the layout
//! follows `pprint`: a container that does not fit in the remaining width
//! puts one item per line, aligned after its opening bracket.

use crate::{EncodeOptions, Key, Result, Table, Value};
use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Timelike};
use std::fmt::Write;

pub fn encode(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut output = match options.indent {
        None => repr(value),
        Some(indent) => {
            let mut printer = Printer {
                output: String::with_capacity(256),
                per_level: indent,
                width: options.width,
            };
            printer.format(value, 0, 0);
            printer.output
        }
    };
    output.push('\n');
    Ok(output.into_bytes())
}

struct Printer {
    output: String,
    per_level: usize,
    width: usize,
}

impl Printer {
    fn format(&mut self, value: &Value, indent: usize, allowance: usize) {
        let rep = repr(value);
        let fits = rep.chars().count() + indent + allowance <= self.width;
        match value {
            Value::Table(table) if !fits && !table.is_empty() => {
                self.dict(table, indent, allowance)
            }
            Value::Array(items) if !fits && !items.is_empty() => {
                self.list(items, indent, allowance)
            }
            _ => self.output.push_str(&rep),
        }
    }

    fn dict(&mut self, table: &Table, indent: usize, allowance: usize) {
        self.output.push('{');
        self.pad(self.per_level.saturating_sub(1));
        let indent = indent + self.per_level;
        let last = table.len() - 1;
        for (i, (key, value)) in table.iter().enumerate() {
            let rep = key_repr(key);
            self.output.push_str(&rep);
            self.output.push_str(": ");
            let inner = if i == last { allowance + 1 } else { 1 };
            self.format(value, indent + rep.chars().count() + 2, inner);
            if i != last {
                self.output.push_str(",\n");
                self.pad(indent);
            }
        }
        self.output.push('}');
    }

    fn list(&mut self, items: &[Value], indent: usize, allowance: usize) {
        self.output.push('[');
        self.pad(self.per_level.saturating_sub(1));
        let indent = indent + self.per_level;
        let last = items.len() - 1;
        for (i, item) in items.iter().enumerate() {
            let inner = if i == last { allowance + 1 } else { 1 };
            self.format(item, indent, inner);
            if i != last {
                self.output.push_str(",\n");
                self.pad(indent);
            }
        }
        self.output.push(']');
    }

    fn pad(&mut self, n: usize) {
        self.output.extend(std::iter::repeat(' ').take(n));
    }
}

fn repr(value: &Value) -> String {
    let mut out = String::new();
    write_repr(&mut out, value);
    out
}

fn key_repr(key: &Key) -> String {
    repr(&Value::from(key.clone()))
}

fn write_repr(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Integer(i) => out.push_str(&i.to_string()),
        Value::Float(f) => out.push_str(&float(*f)),
        Value::String(s) => string(out, s),
        Value::Binary(bytes) => binary(out, bytes),
        Value::LocalDate(d) => {
            let _ = write!(out, "datetime.date({}, {}, {})", d.year(), d.month(), d.day());
        }
        Value::LocalTime(t) => {
            out.push_str("datetime.time(");
            time_fields(out, t);
            out.push(')');
        }
        Value::LocalDateTime(dt) => {
            let _ = write!(out, "datetime.datetime({}, {}, {}, ", dt.year(), dt.month(), dt.day());
            time_fields(out, &dt.time());
            out.push(')');
        }
        Value::OffsetDateTime(dt) => offset_datetime(out, dt),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(out, item);
            }
            out.push(']');
        }
        Value::Table(table) => {
            out.push('{');
            for (i, (key, item)) in table.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&key_repr(key));
                out.push_str(": ");
                write_repr(out, item);
            }
            out.push('}');
        }
    }
}

/// Hour and minute always; seconds and microseconds only when nonzero.
fn time_fields(out: &mut String, t: &NaiveTime) {
    let micros = t.nanosecond() / 1_000;
    let _ = write!(out, "{}, {}", t.hour(), t.minute());
    if t.second() != 0 || micros != 0 {
        let _ = write!(out, ", {}", t.second());
    }
    if micros != 0 {
        let _ = write!(out, ", {}", micros);
    }
}

fn offset_datetime(out: &mut String, dt: &DateTime<FixedOffset>) {
    let _ = write!(out, "datetime.datetime({}, {}, {}, ", dt.year(), dt.month(), dt.day());
    time_fields(out, &dt.time());
    let seconds = dt.offset().local_minus_utc();
    match seconds {
        0 => out.push_str(", tzinfo=datetime.timezone.utc)"),
        s if s > 0 => {
            let _ = write!(
                out,
                ", tzinfo=datetime.timezone(datetime.timedelta(seconds={})))",
                s
            );
        }
        // timedelta keeps seconds non-negative and borrows a day.
        s => {
            let _ = write!(
                out,
                ", tzinfo=datetime.timezone(datetime.timedelta(days=-1, seconds={})))",
                86_400 + s
            );
        }
    }
}

/// Python's float repr: shortest round-trip digits, scientific notation
/// outside `1e-4 <= |x| < 1e16`, exponents with a sign and two digits.
fn float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let sci = format!("{:e}", f);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if f == 0.0 || (-4..16).contains(&exponent) {
        let plain = f.to_string();
        if plain.contains('.') {
            plain
        } else {
            plain + ".0"
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

fn python_printable(c: char) -> bool {
    !c.is_control()
        && !matches!(
            c,
            '\u{00A0}'
                | '\u{00AD}'
                | '\u{1680}'
                | '\u{2000}'..='\u{200F}'
                | '\u{2028}'..='\u{202F}'
                | '\u{205F}'..='\u{2064}'
                | '\u{3000}'
                | '\u{FEFF}'
        )
}

fn quote_for(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double {
        '"'
    } else {
        '\''
    }
}

fn string(out: &mut String, s: &str) {
    let quote = quote_for(s.contains('\''), s.contains('"'));
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !python_printable(c) => {
                let code = u32::from(c);
                let _ = if code <= 0xFF {
                    write!(out, "\\x{:02x}", code)
                } else if code <= 0xFFFF {
                    write!(out, "\\u{:04x}", code)
                } else {
                    write!(out, "\\U{:08x}", code)
                };
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

fn binary(out: &mut String, bytes: &[u8]) {
    let quote = quote_for(bytes.contains(&b'\''), bytes.contains(&b'"'));
    out.push('b');
    out.push(quote);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if char::from(b) == quote => {
                out.push('\\');
                out.push(char::from(b));
            }
            0x20..=0x7e => out.push(char::from(b)),
            b => {
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out.push(quote);
}
