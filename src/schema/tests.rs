use super::common::{Field, Name};
use super::{Schema, Variant};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::str::FromStr;

fn primitive_schema_objects() -> HashMap<&'static str, Variant> {
    let mut s = HashMap::new();
    s.insert(r##"{ "type": "null" }"##, Variant::Null);
    s.insert(r##"{ "type": "boolean" }"##, Variant::Boolean);
    s.insert(r##"{ "type": "int" }"##, Variant::Int);
    s.insert(r##"{ "type": "long" }"##, Variant::Long);
    s.insert(r##"{ "type": "float" }"##, Variant::Float);
    s.insert(r##"{ "type": "double" }"##, Variant::Double);
    s.insert(r##"{ "type": "bytes" }"##, Variant::Bytes);
    s.insert(r##"{ "type": "string" }"##, Variant::Str);
    s
}

fn primitive_schema_canonical() -> HashMap<&'static str, Variant> {
    let mut s = HashMap::new();
    s.insert(r##""null""##, Variant::Null);
    s.insert(r##""boolean""##, Variant::Boolean);
    s.insert(r##""int""##, Variant::Int);
    s.insert(r##""long""##, Variant::Long);
    s.insert(r##""float""##, Variant::Float);
    s.insert(r##""double""##, Variant::Double);
    s.insert(r##""bytes""##, Variant::Bytes);
    s.insert(r##""string""##, Variant::Str);
    s
}

#[test]
fn parse_primitives_as_json_objects() {
    for (s, v) in primitive_schema_objects() {
        let schema = Schema::from_str(s).unwrap();
        assert_eq!(schema.variant, v);
    }
}

#[test]
fn parse_primitives_as_defined_types() {
    for (s, v) in primitive_schema_canonical() {
        let schema = Schema::from_str(s).unwrap();
        assert_eq!(schema.variant, v);
    }
}

#[test]
fn parse_record_keeps_raw_defaults() {
    let schema = Schema::from_str(
        r##"{
            "type": "record",
            "name": "Can",
            "namespace": "com.avresolve",
            "fields" : [
                {
                    "name": "next",
                    "type": ["null", "Can"]
                },
                {
                    "name": "value",
                    "type": "long",
                    "default": 1
                }
            ]
        }"##,
    )
    .unwrap();

    let mut fields = IndexMap::new();
    let f1 = Field::new(
        "next",
        Variant::Union {
            variants: vec![Variant::Null, Variant::Named("com.avresolve.Can".to_string())],
        },
        None,
    )
    .unwrap();
    let f2 = Field::new("value", Variant::Long, Some(serde_json::json!(1))).unwrap();
    fields.insert("next".to_string(), f1);
    fields.insert("value".to_string(), f2);

    let mut name = Name::new("Can").unwrap();
    name.set_namespace("com.avresolve").unwrap();

    let s = Variant::Record { name, fields };

    assert_eq!(&s, schema.variant());

    // defaults are stored as parsed json literals, uninterpreted
    if let Variant::Record { fields, .. } = schema.variant() {
        assert_eq!(fields["value"].default, Some(serde_json::json!(1)));
        assert_eq!(fields["next"].default, None);
    } else {
        panic!("expected a record schema");
    }
}

#[test]
fn nested_record_fields_parses_properly_with_fullnames() {
    let schema = Schema::from_str(r##"{
        "name": "longlist",
        "namespace": "com.some",
        "type":"record",
        "fields": [
            {"name": "magic", "type": {"type": "fixed", "name": "magic", "size": 4, "namespace": "com.bar"}
            },
            {"name": "inner_rec", "type": {"type": "record", "name": "inner_rec", "fields": [
                {
                    "name": "test",
                    "type": {"type": "fixed", "name":"hello", "size":5}
                }
            ]}}
        ]
    }"##).unwrap();

    assert!(schema.cxt.cxt.contains_key("com.bar.magic"));
    assert!(schema.cxt.cxt.contains_key("com.some.hello"));
    assert!(schema.cxt.cxt.contains_key("com.some.longlist"));
    assert!(schema.cxt.cxt.contains_key("com.some.inner_rec"));
}

#[test]
fn union_rejects_duplicate_branches() {
    assert!(Schema::from_str(r##"["int", "int"]"##).is_err());
    assert!(Schema::from_str(r##"["int", ["null", "int"]]"##).is_err());
}

#[test]
fn writer_reader_promotions_match() {
    let widenings = [
        ("\"int\"", "\"long\""),
        ("\"int\"", "\"float\""),
        ("\"int\"", "\"double\""),
        ("\"long\"", "\"float\""),
        ("\"long\"", "\"double\""),
        ("\"float\"", "\"double\""),
    ];
    for (w, r) in &widenings {
        let w = Schema::from_str(w).unwrap();
        let r = Schema::from_str(r).unwrap();
        assert!(w.matches(&r), "expected writer to resolve into reader");
        assert!(!r.matches(&w), "widenings must not hold in reverse");
    }

    // bytes and string coerce in both directions
    let bytes = Schema::from_str("\"bytes\"").unwrap();
    let string = Schema::from_str("\"string\"").unwrap();
    assert!(bytes.matches(&string));
    assert!(string.matches(&bytes));
}

#[test]
fn narrowing_and_unrelated_pairs_do_not_match() {
    let cases = [
        ("\"double\"", "\"float\""),
        ("\"long\"", "\"int\""),
        ("\"null\"", "\"boolean\""),
        ("\"int\"", "\"string\""),
        (
            r##"{"type": "fixed", "name": "md5", "size": 16}"##,
            r##"{"type": "fixed", "name": "md5", "size": 8}"##,
        ),
        (
            r##"{"type": "record", "name": "a", "fields": [{"name": "x", "type": "int"}]}"##,
            r##"{"type": "record", "name": "b", "fields": [{"name": "x", "type": "int"}]}"##,
        ),
    ];
    for (w, r) in &cases {
        let w = Schema::from_str(w).unwrap();
        let r = Schema::from_str(r).unwrap();
        assert!(!w.matches(&r), "unexpected match");
    }
}

#[test]
fn arrays_and_maps_match_recursively() {
    let w = Schema::from_str(r##"{"type": "array", "items": "int"}"##).unwrap();
    let r = Schema::from_str(r##"{"type": "array", "items": "double"}"##).unwrap();
    assert!(w.matches(&r));

    let w = Schema::from_str(r##"{"type": "map", "values": "bytes"}"##).unwrap();
    let r = Schema::from_str(r##"{"type": "map", "values": "string"}"##).unwrap();
    assert!(w.matches(&r));

    let w = Schema::from_str(r##"{"type": "map", "values": "string"}"##).unwrap();
    let r = Schema::from_str(r##"{"type": "map", "values": "int"}"##).unwrap();
    assert!(!w.matches(&r));
}

#[test]
fn unions_are_deferred_to_branch_selection() {
    let w = Schema::from_str(r##"["null", "int"]"##).unwrap();
    let r = Schema::from_str(r##""boolean""##).unwrap();
    assert!(w.matches(&r));
    assert!(r.matches(&w));
}
