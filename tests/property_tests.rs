//! Property-based tests over generated documents.
//!
//! Documents stick to kinds every format holds natively (no dates, no
//! binary, string keys), so each one must survive a trip through any
//! format unchanged.

use proptest::prelude::*;
use remarshal::{
    decode, encode, order, transform, DecodeOptions, EncodeOptions, Error, Format, Key, Table,
    Value, YamlStyle,
};

fn table(entries: Vec<(String, Value)>) -> Value {
    let mut table = Table::new();
    for (k, v) in entries {
        table.insert(Key::String(k), v);
    }
    Value::Table(table)
}

fn scalar(with_null: bool) -> BoxedStrategy<Value> {
    let scalars = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        // multiples of 1/64 print the same in every format
        (-1_000_000i32..1_000_000).prop_map(|n| Value::Float(f64::from(n) / 64.0)),
        "[a-z :#'\"-]{0,12}".prop_map(Value::String),
    ];
    if with_null {
        prop_oneof![Just(Value::Null), scalars].boxed()
    } else {
        scalars.boxed()
    }
}

fn tree(with_null: bool) -> impl Strategy<Value = Value> {
    scalar(with_null).prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,8}", inner), 0..6).prop_map(table),
        ]
    })
}

fn document() -> impl Strategy<Value = Value> {
    prop::collection::vec(("[a-z]{1,8}", tree(true)), 0..6).prop_map(table)
}

fn toml_document() -> impl Strategy<Value = Value> {
    prop::collection::vec(("[a-z]{1,8}", tree(false)), 0..6).prop_map(table)
}

fn roundtrip(value: &Value, format: Format, options: &EncodeOptions) -> Result<Value, Error> {
    let bytes = encode(value, format, options)?;
    decode(&bytes, format, &DecodeOptions::unlimited())
}

proptest! {
    #[test]
    fn prop_json_roundtrip(doc in tree(true)) {
        prop_assert_eq!(roundtrip(&doc, Format::Json, &EncodeOptions::default())?, doc);
    }

    #[test]
    fn prop_json_pretty_roundtrip(doc in document(), indent in 0usize..5) {
        let options = EncodeOptions::new().with_indent(indent);
        prop_assert_eq!(roundtrip(&doc, Format::Json, &options)?, doc);
    }

    #[test]
    fn prop_yaml_roundtrip(doc in tree(true)) {
        prop_assert_eq!(roundtrip(&doc, Format::Yaml, &EncodeOptions::default())?, doc);
    }

    #[test]
    fn prop_yaml_styles_roundtrip(
        doc in document(),
        style in prop_oneof![
            Just(YamlStyle::Plain),
            Just(YamlStyle::SingleQuoted),
            Just(YamlStyle::DoubleQuoted),
            Just(YamlStyle::Literal),
            Just(YamlStyle::Folded),
        ],
    ) {
        let options = EncodeOptions::new().with_yaml_style(style);
        prop_assert_eq!(roundtrip(&doc, Format::Yaml, &options)?, doc);
    }

    #[test]
    fn prop_toml_roundtrip(doc in toml_document()) {
        prop_assert_eq!(roundtrip(&doc, Format::Toml, &EncodeOptions::default())?, doc);
    }

    #[test]
    fn prop_cbor_roundtrip(doc in tree(true)) {
        prop_assert_eq!(roundtrip(&doc, Format::Cbor, &EncodeOptions::default())?, doc);
    }

    #[test]
    fn prop_msgpack_roundtrip(doc in tree(true)) {
        prop_assert_eq!(roundtrip(&doc, Format::Msgpack, &EncodeOptions::default())?, doc);
    }

    #[test]
    fn prop_encode_is_idempotent(doc in document()) {
        for format in [Format::Cbor, Format::Json, Format::Msgpack, Format::Yaml] {
            let options = EncodeOptions::default();
            let first = encode(&doc, format, &options)?;
            let again = encode(&decode(&first, format, &DecodeOptions::unlimited())?, format, &options)?;
            prop_assert_eq!(first, again);
        }
    }

    #[test]
    fn prop_wrap_then_unwrap(doc in tree(true), key in "[a-z]{1,8}") {
        let wrapped = transform(doc.clone(), Some(key.as_str()), None)?;
        prop_assert_eq!(transform(wrapped, None, Some(key.as_str()))?, doc);
    }

    #[test]
    fn prop_sort_keeps_content(doc in document()) {
        let sorted = order::sort_keys(&doc);
        prop_assert_eq!(&sorted, &doc);
        prop_assert_eq!(order::sort_keys(&sorted), sorted);
    }

    #[test]
    fn prop_ceiling_counts_every_node(doc in tree(true)) {
        let nodes = doc.node_count();
        for format in [Format::Cbor, Format::Json, Format::Msgpack, Format::Yaml] {
            let bytes = encode(&doc, format, &EncodeOptions::default())?;
            let exact = DecodeOptions::new().with_max_values(nodes as i64);
            prop_assert!(decode(&bytes, format, &exact).is_ok());
            if nodes > 1 {
                let short = DecodeOptions::new().with_max_values(nodes as i64 - 1);
                let is_limit = matches!(decode(&bytes, format, &short), Err(Error::ResourceLimit { .. }));
                prop_assert!(is_limit);
            }
        }
    }
}
