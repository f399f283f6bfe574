//! Configuration for decoding, encoding and whole conversions.
//!
//! - [`Format`]: the supported serialization formats
//! - [`DecodeOptions`]: resource ceiling for decoders
//! - [`EncodeOptions`]: layout, key ordering and stringify policy for encoders
//! - [`ConvertOptions`]: everything [`convert`](crate::convert) needs
//!
//! Every option struct deserializes with defaults for missing fields, so a
//! front end can keep its settings in any format this crate reads.
//!
//! ## Examples
//!
//! ```rust
//! use remarshal::{ConvertOptions, Format, YamlStyle};
//!
//! let options = ConvertOptions::new(Format::Json, Format::Yaml)
//!     .with_indent(4)
//!     .with_yaml_style(YamlStyle::Literal)
//!     .with_wrap("data");
//!
//! assert_eq!(options.encode.indent, Some(4));
//! assert_eq!(options.wrap.as_deref(), Some("data"));
//! ```

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_VALUES: i64 = 1_000_000;
pub const DEFAULT_WIDTH: usize = 80;
pub const DEFAULT_YAML_INDENT: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Cbor,
    Json,
    #[serde(alias = "messagepack")]
    Msgpack,
    /// Python literal; output only.
    Python,
    Toml,
    #[serde(alias = "yml")]
    Yaml,
}

impl Format {
    pub const INPUTS: [Format; 5] = [
        Format::Cbor,
        Format::Json,
        Format::Msgpack,
        Format::Toml,
        Format::Yaml,
    ];

    pub const OUTPUTS: [Format; 6] = [
        Format::Cbor,
        Format::Json,
        Format::Msgpack,
        Format::Python,
        Format::Toml,
        Format::Yaml,
    ];

    /// Short lowercase identifier, as used on command lines.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Format::Cbor => "cbor",
            Format::Json => "json",
            Format::Msgpack => "msgpack",
            Format::Python => "python",
            Format::Toml => "toml",
            Format::Yaml => "yaml",
        }
    }

    #[must_use]
    pub const fn is_input(&self) -> bool {
        !matches!(self, Format::Python)
    }

    /// Text formats get a trailing newline; CBOR and MessagePack are binary.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Format::Cbor | Format::Msgpack)
    }

    /// Guesses a format from a file extension (`"yml"`, `"py"` included).
    ///
    /// ```rust
    /// use remarshal::Format;
    ///
    /// assert_eq!(Format::from_extension("data.yml"), Some(Format::Yaml));
    /// assert_eq!(Format::from_extension("out.py"), Some(Format::Python));
    /// assert_eq!(Format::from_extension("notes.txt"), None);
    /// ```
    #[must_use]
    pub fn from_extension(path: &str) -> Option<Format> {
        let ext = std::path::Path::new(path).extension()?.to_str()?;
        match ext {
            "py" => Some(Format::Python),
            "yml" => Some(Format::Yaml),
            other => other.parse().ok(),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Cbor => "CBOR",
            Format::Json => "JSON",
            Format::Msgpack => "MessagePack",
            Format::Python => "Python",
            Format::Toml => "TOML",
            Format::Yaml => "YAML",
        })
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cbor" => Ok(Format::Cbor),
            "json" => Ok(Format::Json),
            "msgpack" | "messagepack" => Ok(Format::Msgpack),
            "python" => Ok(Format::Python),
            "toml" => Ok(Format::Toml),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// Quoting style for YAML string values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YamlStyle {
    /// Plain scalars where the string reads back unchanged, quotes otherwise.
    #[default]
    #[serde(rename = "")]
    Plain,
    #[serde(rename = "'")]
    SingleQuoted,
    #[serde(rename = "\"")]
    DoubleQuoted,
    /// Block literal `|`.
    #[serde(rename = "|")]
    Literal,
    /// Block folded `>`.
    #[serde(rename = ">")]
    Folded,
}

impl FromStr for YamlStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(YamlStyle::Plain),
            "'" => Ok(YamlStyle::SingleQuoted),
            "\"" => Ok(YamlStyle::DoubleQuoted),
            "|" => Ok(YamlStyle::Literal),
            ">" => Ok(YamlStyle::Folded),
            _ => Err(Error::custom(format!("unknown YAML style {:?}", s))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Ceiling on the number of values a decoder may produce. Zero or
    /// negative means unlimited.
    pub max_values: i64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_values: DEFAULT_MAX_VALUES,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn unlimited() -> Self {
        DecodeOptions { max_values: 0 }
    }

    #[must_use]
    pub fn with_max_values(mut self, max_values: i64) -> Self {
        self.max_values = max_values;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// JSON: `None` is compact. YAML: `None` means 2. Python: `None` is one line.
    pub indent: Option<usize>,
    pub sort_keys: bool,
    pub stringify: bool,
    pub yaml_style: YamlStyle,
    /// Line width for folded YAML scalars and pretty Python output.
    pub width: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            indent: None,
            sort_keys: false,
            stringify: false,
            yaml_style: YamlStyle::default(),
            width: DEFAULT_WIDTH,
        }
    }
}

impl EncodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }

    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    #[must_use]
    pub fn with_stringify(mut self, stringify: bool) -> Self {
        self.stringify = stringify;
        self
    }

    #[must_use]
    pub fn with_yaml_style(mut self, style: YamlStyle) -> Self {
        self.yaml_style = style;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub(crate) fn yaml_indent(&self) -> usize {
        self.indent.filter(|n| *n > 0).unwrap_or(DEFAULT_YAML_INDENT)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvertOptions {
    pub input: Format,
    pub output: Format,
    #[serde(default)]
    pub decode: DecodeOptions,
    #[serde(default)]
    pub encode: EncodeOptions,
    #[serde(default)]
    pub wrap: Option<String>,
    #[serde(default)]
    pub unwrap: Option<String>,
}

impl ConvertOptions {
    #[must_use]
    pub fn new(input: Format, output: Format) -> Self {
        ConvertOptions {
            input,
            output,
            decode: DecodeOptions::default(),
            encode: EncodeOptions::default(),
            wrap: None,
            unwrap: None,
        }
    }

    #[must_use]
    pub fn with_max_values(mut self, max_values: i64) -> Self {
        self.decode.max_values = max_values;
        self
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.encode.indent = Some(indent);
        self
    }

    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.encode.sort_keys = sort_keys;
        self
    }

    #[must_use]
    pub fn with_stringify(mut self, stringify: bool) -> Self {
        self.encode.stringify = stringify;
        self
    }

    #[must_use]
    pub fn with_yaml_style(mut self, style: YamlStyle) -> Self {
        self.encode.yaml_style = style;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.encode.width = width;
        self
    }

    #[must_use]
    pub fn with_wrap(mut self, key: &str) -> Self {
        self.wrap = Some(key.to_string());
        self
    }

    #[must_use]
    pub fn with_unwrap(mut self, key: &str) -> Self {
        self.unwrap = Some(key.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("yml".parse::<Format>().unwrap(), Format::Yaml);
        assert!("ini".parse::<Format>().is_err());
        assert!(!Format::Python.is_input());
        assert!(Format::Cbor.is_binary());
    }

    #[test]
    fn test_yaml_indent_fallback() {
        assert_eq!(EncodeOptions::new().yaml_indent(), 2);
        assert_eq!(EncodeOptions::new().with_indent(4).yaml_indent(), 4);
        assert_eq!(EncodeOptions::new().with_indent(0).yaml_indent(), 2);
    }

    #[test]
    fn test_options_from_json() {
        let options: ConvertOptions = serde_json::from_str(
            r#"{"input": "yaml", "output": "json", "encode": {"sort_keys": true, "yaml_style": "|"}}"#,
        )
        .unwrap();

        assert_eq!(options.input, Format::Yaml);
        assert!(options.encode.sort_keys);
        assert_eq!(options.encode.yaml_style, YamlStyle::Literal);
        assert_eq!(options.encode.width, DEFAULT_WIDTH);
        assert_eq!(options.decode.max_values, DEFAULT_MAX_VALUES);
        assert_eq!(options.wrap, None);
    }
}
