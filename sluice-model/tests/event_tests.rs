use proptest::prelude::*;
use serde_json::json;
use sluice_model::{Event, FieldSelector, ModelError};

// ── FieldSelector ────────────────────────────────────────────────

#[test]
fn parses_stream_prefixed_selector() {
    let s = FieldSelector::parse("s0::b::c").unwrap();
    assert_eq!(s.stream(), Some("s0"));
    assert_eq!(s.path(), &["b".to_string(), "c".to_string()]);
    assert_eq!(s.flattened_name(), "b_c");
    assert_eq!(s.to_string(), "s0::b::c");
}

#[test]
fn parses_bare_selector() {
    let s: FieldSelector = "temperature".parse().unwrap();
    assert_eq!(s.stream(), None);
    assert_eq!(s.flattened_name(), "temperature");
}

#[test]
fn lone_stream_like_name_is_a_field() {
    let s = FieldSelector::parse("s1").unwrap();
    assert_eq!(s.stream(), None);
    assert_eq!(s.path(), &["s1".to_string()]);
}

#[test]
fn empty_segments_are_rejected() {
    for bad in ["", "s0::", "::a", "a::::b"] {
        assert!(
            matches!(FieldSelector::parse(bad), Err(ModelError::InvalidSelector(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn selector_serializes_as_string() {
    let s = FieldSelector::parse("s0::a::b").unwrap();
    assert_eq!(serde_json::to_value(&s).unwrap(), json!("s0::a::b"));
    let back: FieldSelector = serde_json::from_value(json!("s0::a::b")).unwrap();
    assert_eq!(back, s);
}

// ── Event lookup ─────────────────────────────────────────────────

#[test]
fn event_get_walks_nested_objects() {
    let e = Event::from_value(json!({"a": 1, "b": {"c": 2.5, "d": true}})).unwrap();
    assert_eq!(e.get_number(&FieldSelector::parse("s0::a").unwrap()), Some(1.0));
    assert_eq!(e.get_number(&FieldSelector::parse("b::c").unwrap()), Some(2.5));
    assert_eq!(e.get_bool(&FieldSelector::new(["b", "d"])), Some(true));
}

#[test]
fn event_get_missing_is_none() {
    let e = Event::new().with_field("a", 1);
    assert!(e.get(&FieldSelector::new(["b"])).is_none());
    assert!(e.get(&FieldSelector::new(["a", "x"])).is_none());
}

#[test]
fn event_get_reads_first_array_element_past_a_list() {
    let e = Event::from_value(json!({"items": [{"x": 1.0}, {"x": 2.0}]})).unwrap();
    assert_eq!(e.get_number(&FieldSelector::parse("s0::items::x").unwrap()), Some(1.0));
    assert_eq!(
        e.get(&FieldSelector::new(["items"])),
        Some(&json!([{"x": 1.0}, {"x": 2.0}]))
    );

    let nested = Event::from_value(json!({"rows": [[{"cell": 4}]]})).unwrap();
    assert_eq!(nested.get_number(&FieldSelector::new(["rows", "cell"])), Some(4.0));

    let empty = Event::from_value(json!({"items": []})).unwrap();
    assert!(empty.get(&FieldSelector::new(["items", "x"])).is_none());
}

#[test]
fn unprefixed_reads_stream_segment_as_field() {
    let s = FieldSelector::parse("s1::x").unwrap();
    let literal = s.unprefixed().unwrap();
    assert_eq!(literal.stream(), None);
    assert_eq!(literal.path(), &["s1".to_string(), "x".to_string()]);
    assert_eq!(literal.flattened_name(), "s1_x");

    assert!(FieldSelector::parse("a::b").unwrap().unprefixed().is_none());
}

#[test]
fn event_rejects_non_objects() {
    let err = Event::from_value(json!([1, 2])).unwrap_err();
    assert!(matches!(err, ModelError::NotAnObject(kind) if kind == "array"));
}

#[test]
fn event_from_slice_parses_json() {
    let e = Event::from_slice(br#"{"name":"x"}"#).unwrap();
    assert_eq!(e.get_str(&FieldSelector::new(["name"])), Some("x"));
}

proptest! {
    #[test]
    fn selector_display_parse_roundtrip(
        stream in proptest::option::of(0u8..10),
        path in proptest::collection::vec("[a-rt-z][a-z0-9_]{0,8}", 1..5),
    ) {
        let text = match stream {
            Some(i) => format!("s{i}::{}", path.join("::")),
            None => path.join("::"),
        };
        let parsed = FieldSelector::parse(&text).unwrap();
        prop_assert_eq!(parsed.to_string(), text);
        prop_assert_eq!(parsed.flattened_name(), path.join("_"));
    }
}
