//! Error types for conversions.
//!
//! Every stage of the pipeline fails with a variant of [`Error`], and every
//! failure is terminal: no partial output is ever produced.
//!
//! ## Error Categories
//!
//! - **Decode**: the source bytes are not valid for their format
//! - **ResourceLimit**: the source holds more values than the configured ceiling
//! - **Unwrap**: the unwrap key cannot be applied to the root
//! - **Loss**: the target can only hold a node after stringifying it, and stringify is off
//! - **Encode**: the target cannot hold a node at all, or the root has the wrong shape
//!
//! ## Examples
//!
//! ```rust
//! use remarshal::{decode, DecodeOptions, Error, Format};
//!
//! let result = decode(b"{\"a\": ", Format::Json, &DecodeOptions::default());
//!
//! match result {
//!     Err(Error::Decode { format, .. }) => assert_eq!(format, Format::Json),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use crate::{Format, Path, ValueKind};
use std::fmt;
use thiserror::Error;

/// Where in the source a decoder gave up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Position {
    LineColumn { line: usize, column: usize },
    Offset(usize),
    Unknown,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::LineColumn { line, column } => {
                write!(f, "line {}, column {}", line, column)
            }
            Position::Offset(offset) => write!(f, "byte {}", offset),
            Position::Unknown => f.write_str("unknown position"),
        }
    }
}

/// Whether a loss concerns a table key or a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subject {
    Key,
    Value,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Subject::Key => "table key",
            Subject::Value => "value",
        })
    }
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed source bytes
    #[error("Cannot parse as {format} at {position}: {msg}")]
    Decode {
        format: Format,
        position: Position,
        msg: String,
    },

    /// Value-count ceiling exceeded while decoding
    #[error("Document contains too many values (over {limit})")]
    ResourceLimit { limit: u64 },

    /// Root is not a table, or lacks the unwrap key
    #[error("Cannot unwrap key {key:?}: {msg}")]
    Unwrap { key: String, msg: String },

    /// Representable only through stringify, which is disabled
    #[error("{subject} is {kind} at {path}; cannot represent in {format} without stringify")]
    Loss {
        subject: Subject,
        kind: ValueKind,
        format: Format,
        path: Path,
    },

    /// Not representable in the target format under any policy
    #[error("Cannot convert data to {format} at {path}: {msg}")]
    Encode {
        format: Format,
        kind: Option<ValueKind>,
        path: Path,
        msg: String,
    },

    #[error("{0} is an output-only format")]
    UnsupportedInput(Format),

    #[error("Unknown format: {0:?}")]
    UnknownFormat(String),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates a decode error for `format`.
    ///
    /// ```rust
    /// use remarshal::{Error, Format, Position};
    ///
    /// let err = Error::decode(Format::Toml, Position::LineColumn { line: 3, column: 7 }, "expected `=`");
    /// assert!(err.to_string().contains("line 3, column 7"));
    /// ```
    pub fn decode<T: fmt::Display>(format: Format, position: Position, msg: T) -> Self {
        Error::Decode {
            format,
            position,
            msg: msg.to_string(),
        }
    }

    pub fn encode<T: fmt::Display>(
        format: Format,
        kind: Option<ValueKind>,
        path: &Path,
        msg: T,
    ) -> Self {
        Error::Encode {
            format,
            kind,
            path: path.clone(),
            msg: msg.to_string(),
        }
    }

    pub fn loss(subject: Subject, kind: ValueKind, format: Format, path: &Path) -> Self {
        Error::Loss {
            subject,
            kind,
            format,
            path: path.clone(),
        }
    }

    pub fn unwrap_failure<T: fmt::Display>(key: &str, msg: T) -> Self {
        Error::Unwrap {
            key: key.to_string(),
            msg: msg.to_string(),
        }
    }

    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Key;

    #[test]
    fn test_loss_message() {
        let err = Error::loss(Subject::Key, ValueKind::Bool, Format::Json, &Path::root());
        assert_eq!(
            err.to_string(),
            "table key is boolean at $; cannot represent in JSON without stringify"
        );
    }

    #[test]
    fn test_encode_message_has_path() {
        let mut path = Path::root();
        path.push_key(Key::from("when"));
        let err = Error::encode(
            Format::Toml,
            Some(ValueKind::LocalTime),
            &path,
            "local time is not supported",
        );
        assert_eq!(
            err.to_string(),
            "Cannot convert data to TOML at $.when: local time is not supported"
        );
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::Offset(12).to_string(), "byte 12");
        assert_eq!(Position::Unknown.to_string(), "unknown position");
    }
}
