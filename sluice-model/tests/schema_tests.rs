use sluice_model::{xsd, EventProperty, EventSchema, PrimitiveType, PropertyRequirement};

fn sample_schema() -> EventSchema {
    EventSchema::new(vec![
        EventProperty::primitive("a", xsd::INTEGER),
        EventProperty::nested(
            "b",
            vec![
                EventProperty::primitive("c", xsd::FLOAT),
                EventProperty::primitive("d", xsd::BOOLEAN),
            ],
        ),
        EventProperty::list(
            "readings",
            EventProperty::nested("", vec![EventProperty::primitive("value", xsd::DOUBLE)]),
        ),
        EventProperty::list("embedding", EventProperty::primitive("", xsd::FLOAT)),
        EventProperty::primitive("label", xsd::STRING),
    ])
}

// ── PrimitiveType::parse ─────────────────────────────────────────

#[test]
fn parses_full_xsd_uris() {
    assert_eq!(PrimitiveType::parse(xsd::INTEGER), PrimitiveType::Integer);
    assert_eq!(PrimitiveType::parse(xsd::LONG), PrimitiveType::Long);
    assert_eq!(PrimitiveType::parse(xsd::FLOAT), PrimitiveType::Float);
    assert_eq!(PrimitiveType::parse(xsd::DOUBLE), PrimitiveType::Double);
    assert_eq!(PrimitiveType::parse(xsd::BOOLEAN), PrimitiveType::Boolean);
    assert_eq!(PrimitiveType::parse(xsd::STRING), PrimitiveType::String);
}

#[test]
fn parses_prefixed_and_bare_names() {
    assert_eq!(PrimitiveType::parse("xsd:long"), PrimitiveType::Long);
    assert_eq!(PrimitiveType::parse("int"), PrimitiveType::Integer);
    assert_eq!(PrimitiveType::parse("double"), PrimitiveType::Double);
}

#[test]
fn unknown_tag_is_kept_verbatim() {
    assert_eq!(
        PrimitiveType::parse("http://schema.org/DateTime"),
        PrimitiveType::Other("http://schema.org/DateTime".into())
    );
}

// ── EventSchema::property_at ─────────────────────────────────────

#[test]
fn resolves_top_level_and_nested_paths() {
    let s = sample_schema();
    assert_eq!(s.property_at(&["a"]).unwrap().runtime_name(), "a");
    assert_eq!(s.property_at(&["b", "d"]).unwrap().runtime_name(), "d");
}

#[test]
fn resolves_through_list_elements() {
    let s = sample_schema();
    let value = s.property_at(&["readings", "value"]).unwrap();
    assert_eq!(value.primitive_type(), Some(PrimitiveType::Double));
}

#[test]
fn missing_paths_resolve_to_none() {
    let s = sample_schema();
    assert!(s.property_at(&["zzz"]).is_none());
    assert!(s.property_at(&["a", "child"]).is_none());
    assert!(s.property_at::<&str>(&[]).is_none());
}

// ── Requirements ─────────────────────────────────────────────────

#[test]
fn number_requirement_accepts_numeric_primitives_only() {
    let s = sample_schema();
    assert!(s.property_at(&["a"]).unwrap().satisfies(PropertyRequirement::Number));
    assert!(s.property_at(&["b", "c"]).unwrap().satisfies(PropertyRequirement::Number));
    assert!(!s.property_at(&["b", "d"]).unwrap().satisfies(PropertyRequirement::Number));
    assert!(!s.property_at(&["label"]).unwrap().satisfies(PropertyRequirement::Number));
}

#[test]
fn list_of_numbers_satisfies_number() {
    let s = sample_schema();
    assert!(s.property_at(&["embedding"]).unwrap().satisfies(PropertyRequirement::Number));
}

#[test]
fn nested_property_only_satisfies_any() {
    let s = sample_schema();
    let b = s.property_at(&["b"]).unwrap();
    assert!(b.satisfies(PropertyRequirement::Any));
    assert!(!b.satisfies(PropertyRequirement::Text));
}

#[test]
fn schema_deserializes_from_tagged_json() {
    let json = r#"{"properties":[
        {"type":"primitive","runtime_name":"a","runtime_type":"xsd:integer"},
        {"type":"nested","runtime_name":"b","properties":[
            {"type":"primitive","runtime_name":"c","runtime_type":"xsd:float"}]}
    ]}"#;
    let s: EventSchema = serde_json::from_str(json).unwrap();
    assert_eq!(s.properties.len(), 2);
    assert_eq!(
        s.property_at(&["b", "c"]).unwrap().primitive_type(),
        Some(PrimitiveType::Float)
    );
}
