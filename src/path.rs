//! Location of a node inside a document, for error messages.

use crate::Key;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Key(Key),
    Index(usize),
}

/// A path from the document root, rendered as `$`, `$.name`, `$["a b"]`,
/// `$[true]` or `$[0]`.
///
/// # Examples
///
/// ```rust
/// use remarshal::{Key, Path};
///
/// let mut path = Path::root();
/// path.push_key(Key::from("servers"));
/// path.push_index(0);
/// path.push_key(Key::Bool(true));
/// assert_eq!(path.to_string(), "$.servers[0][true]");
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Path(Vec<Segment>);

impl Path {
    #[must_use]
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn push_key(&mut self, key: Key) {
        self.0.push(Segment::Key(key));
    }

    pub fn push_index(&mut self, index: usize) {
        self.0.push(Segment::Index(index));
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                Segment::Index(i) => write!(f, "[{}]", i)?,
                Segment::Key(Key::String(s)) if is_identifier(s) => write!(f, ".{}", s)?,
                Segment::Key(Key::String(s)) => write!(f, "[{:?}]", s)?,
                Segment::Key(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}
