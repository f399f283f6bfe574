//! # remarshal
//!
//! Convert documents between TOML, YAML, JSON, CBOR and MessagePack, or
//! print them as Python literals.
//!
//! Every conversion goes through one canonical [`Value`] tree that keeps
//! what the richer formats can say: integers of any size, the four TOML
//! date/time kinds, binary strings and non-string table keys. Nothing is
//! dropped or rewritten silently. When the target format cannot hold a
//! node, the conversion fails with the path of that node, unless the node
//! has a canonical string form and stringify is enabled.
//!
//! ## Pipeline
//!
//! 1. [`decode`] the input bytes (bounded by [`DecodeOptions::max_values`])
//! 2. [`transform`]: unwrap a top-level key, then wrap under a new one
//! 3. [`check_loss`] against the target format
//! 4. sort table keys if requested ([`order::sort_keys`])
//! 5. [`encode`] the tree
//!
//! [`convert`] runs all five steps. [`convert_with`] also runs a caller
//! function on the tree between steps 2 and 3.
//!
//! ## Quick Start
//!
//! ```rust
//! use remarshal::{convert, ConvertOptions, Format};
//!
//! let options = ConvertOptions::new(Format::Json, Format::Yaml);
//! let yaml = convert(br#"{"name": "Alice", "tags": ["a", "b"]}"#, &options).unwrap();
//! assert_eq!(String::from_utf8(yaml).unwrap(), "name: Alice\ntags:\n- a\n- b\n");
//! ```
//!
//! ### Non-table roots and TOML
//!
//! TOML documents are tables, so an array root has to be wrapped first:
//!
//! ```rust
//! use remarshal::{convert, ConvertOptions, Error, Format};
//!
//! let json = br#"[{"a": "b"}, {"c": [1, 2, 3]}]"#;
//! let options = ConvertOptions::new(Format::Json, Format::Toml);
//! assert!(matches!(convert(json, &options), Err(Error::Encode { .. })));
//!
//! let toml = convert(json, &options.with_wrap("main")).unwrap();
//! let back = convert(
//!     &toml,
//!     &ConvertOptions::new(Format::Toml, Format::Json).with_unwrap("main"),
//! )
//! .unwrap();
//! assert_eq!(back, b"[{\"a\":\"b\"},{\"c\":[1,2,3]}]\n");
//! ```
//!
//! ### Working with values
//!
//! ```rust
//! use remarshal::{canon, encode, EncodeOptions, Format};
//!
//! let doc = canon!({"b": 1, "a": [true, null]});
//! let options = EncodeOptions::new().with_sort_keys(true);
//! let json = encode(&doc, Format::Json, &options).unwrap();
//! assert_eq!(json, b"{\"a\":[true,null],\"b\":1}\n");
//! ```
//!
//! ## Logging
//!
//! Each pipeline stage emits a `tracing` debug event; the value ceiling
//! emits a warning when it trips. Install a subscriber to see them.

pub mod error;
pub mod formats;
pub mod guard;
pub mod macros;
pub mod map;
pub mod options;
pub mod order;
pub mod path;
pub mod policy;
pub mod transform;
pub mod value;

pub use error::{Error, Position, Result, Subject};
pub use guard::ValueGuard;
pub use map::Table;
pub use options::{ConvertOptions, DecodeOptions, EncodeOptions, Format, YamlStyle};
pub use path::{Path, Segment};
pub use policy::{check_loss, key_compat, value_compat, Compat};
pub use value::{Key, Value, ValueKind};

/// Decodes `input` as `format` into a [`Value`].
///
/// # Examples
///
/// ```rust
/// use remarshal::{decode, DecodeOptions, Format, Value};
///
/// let doc = decode(b"answer = 42\n", Format::Toml, &DecodeOptions::default()).unwrap();
/// assert_eq!(doc.as_table().unwrap().get_str("answer"), Some(&Value::from(42)));
/// ```
///
/// # Errors
///
/// [`Error::Decode`] for malformed input, [`Error::ResourceLimit`] when the
/// document has more values than allowed, and [`Error::UnsupportedInput`]
/// for output-only formats.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode(input: &[u8], format: Format, options: &DecodeOptions) -> Result<Value> {
    let mut guard = ValueGuard::new(options.max_values);
    let value = formats::decode_with(input, format, &mut guard)?;
    tracing::debug!(
        input = format.id(),
        bytes = input.len(),
        values = guard.count(),
        "decoded"
    );
    Ok(value)
}

/// Unwraps `unwrap` and then wraps under `wrap`, each only when given.
///
/// # Errors
///
/// [`Error::Unwrap`] when the root is not a table or lacks the key.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn transform(value: Value, wrap: Option<&str>, unwrap: Option<&str>) -> Result<Value> {
    transform::apply(value, wrap, unwrap)
}

/// Encodes `value` as `format`.
///
/// Keys are sorted first when [`EncodeOptions::sort_keys`] is set. The
/// value is expected to have passed [`check_loss`]; nodes the format cannot
/// hold are still rejected here, never written lossily.
///
/// # Errors
///
/// [`Error::Encode`] with the path of the first node the format cannot
/// hold.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(value: &Value, format: Format, options: &EncodeOptions) -> Result<Vec<u8>> {
    let out = if options.sort_keys {
        formats::encode_with(&order::sort_keys(value), format, options)?
    } else {
        formats::encode_with(value, format, options)?
    };
    tracing::debug!(output = format.id(), bytes = out.len(), "encoded");
    Ok(out)
}

/// Runs the whole pipeline: decode, transform, check loss, sort, encode.
///
/// # Errors
///
/// The first error of any stage; no output is produced on failure.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn convert(input: &[u8], options: &ConvertOptions) -> Result<Vec<u8>> {
    convert_with(input, options, Ok)
}

/// Like [`convert`], but passes the tree through `f` after unwrap and wrap.
///
/// Whatever `f` returns is still checked against the output format, so it
/// cannot smuggle a node past the loss policy.
///
/// # Examples
///
/// ```rust
/// use remarshal::{convert_with, ConvertOptions, Format, Key, Value};
///
/// let options = ConvertOptions::new(Format::Json, Format::Yaml);
/// let yaml = convert_with(br#"{"draft": true, "title": "x"}"#, &options, |doc| {
///     Ok(match doc {
///         Value::Table(mut t) => {
///             if t.get_str("draft").and_then(Value::as_bool) == Some(true) {
///                 t.shift_remove(&Key::from("draft"));
///             }
///             Value::Table(t)
///         }
///         other => other,
///     })
/// })
/// .unwrap();
/// assert_eq!(yaml, b"title: x\n");
/// ```
///
/// # Errors
///
/// The first error of any stage, including one returned by `f`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn convert_with<F>(input: &[u8], options: &ConvertOptions, f: F) -> Result<Vec<u8>>
where
    F: FnOnce(Value) -> Result<Value>,
{
    tracing::debug!(
        input = options.input.id(),
        output = options.output.id(),
        bytes = input.len(),
        "converting"
    );
    let value = decode(input, options.input, &options.decode)?;
    let value = transform(value, options.wrap.as_deref(), options.unwrap.as_deref())?;
    let value = f(value)?;
    let value = check_loss(value, options.output, options.encode.stringify)?;
    tracing::debug!(output = options.output.id(), "loss check passed");
    encode(&value, options.output, &options.encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon;

    #[test]
    fn test_convert_json_to_yaml() {
        let options = ConvertOptions::new(Format::Json, Format::Yaml);
        let out = convert(br#"{"a": [1, {"b": null}]}"#, &options).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a:\n- 1\n- b: null\n");
    }

    #[test]
    fn test_python_is_output_only() {
        let options = ConvertOptions::new(Format::Python, Format::Json);
        assert!(matches!(
            convert(b"{}", &options),
            Err(Error::UnsupportedInput(Format::Python))
        ));
    }

    #[test]
    fn test_sort_keys_applied_at_encode() {
        let options = ConvertOptions::new(Format::Json, Format::Json).with_sort_keys(true);
        let out = convert(br#"{"b": {"d": 1, "c": 2}, "a": 3}"#, &options).unwrap();
        assert_eq!(out, b"{\"a\":3,\"b\":{\"c\":2,\"d\":1}}\n");
    }

    #[test]
    fn test_convert_with_sees_wrapped_tree() {
        let options = ConvertOptions::new(Format::Json, Format::Json).with_wrap("main");
        let out = convert_with(b"[1, 2]", &options, |doc| {
            let items = doc
                .as_table()
                .and_then(|t| t.get_str("main"))
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            Ok(canon!({"count": (items as i64)}))
        })
        .unwrap();
        assert_eq!(out, b"{\"count\":2}\n");
    }

    #[test]
    fn test_convert_with_result_is_loss_checked() {
        let options = ConvertOptions::new(Format::Json, Format::Toml);
        let err = convert_with(b"{}", &options, |_| Ok(canon!({"a": null}))).unwrap_err();
        assert!(matches!(err, Error::Loss { .. }));

        let err = convert_with(b"{}", &options, |_| Err(Error::custom("rejected"))).unwrap_err();
        assert!(matches!(err, Error::Custom(_)));
    }

    #[test]
    fn test_loss_checked_before_encoding() {
        let options = ConvertOptions::new(Format::Yaml, Format::Json);
        let err = convert(b"true: 1\n", &options).unwrap_err();
        assert_eq!(
            err.to_string(),
            "table key is boolean at $; cannot represent in JSON without stringify"
        );
    }
}
