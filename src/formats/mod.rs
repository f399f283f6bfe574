//! Decode and encode adapters, one module per format.
//!
//! Each adapter turns its codec's native tree into a [`Value`] (and back)
//! right at the boundary. Decoders charge every produced node to a
//! [`ValueGuard`]; encoders report values their format cannot hold as
//! [`Error::Encode`](crate::Error::Encode) with the offending path.

pub mod cbor;
pub mod json;
pub mod msgpack;
pub mod python;
pub mod toml;
pub mod yaml;

use crate::{EncodeOptions, Error, Format, Key, Path, Result, Value, ValueGuard};

pub(crate) fn decode_with(input: &[u8], format: Format, guard: &mut ValueGuard) -> Result<Value> {
    match format {
        Format::Cbor => cbor::decode(input, guard),
        Format::Json => json::decode(input, guard),
        Format::Msgpack => msgpack::decode(input, guard),
        Format::Toml => toml::decode(input, guard),
        Format::Yaml => yaml::decode(input, guard),
        Format::Python => Err(Error::UnsupportedInput(format)),
    }
}

pub(crate) fn encode_with(value: &Value, format: Format, options: &EncodeOptions) -> Result<Vec<u8>> {
    match format {
        Format::Cbor => cbor::encode(value),
        Format::Json => json::encode(value, options),
        Format::Msgpack => msgpack::encode(value),
        Format::Python => python::encode(value, options),
        Format::Toml => toml::encode(value),
        Format::Yaml => yaml::encode(value, options),
    }
}

/// Text decoders want UTF-8; report the first bad byte.
pub(crate) fn utf8(input: &[u8], format: Format) -> Result<&str> {
    std::str::from_utf8(input).map_err(|e| {
        Error::decode(
            format,
            crate::Position::Offset(e.valid_up_to()),
            "invalid UTF-8",
        )
    })
}

/// Shorthand for an encode error about `key` at `path`.
pub(crate) fn key_error(format: Format, key: &Key, path: &Path) -> Error {
    Error::encode(
        format,
        Some(key.kind()),
        path,
        format!("{} keys are not supported", key.kind()),
    )
}
