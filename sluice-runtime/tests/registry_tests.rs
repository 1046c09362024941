mod common;

use common::{Fixed, fixed, init_tracing};
use proptest::prelude::*;
use sluice_runtime::{Declarer, ElementRegistry, VectorStoreSink, get_by_id};
use std::sync::Arc;

// ── get_by_id ───────────────────────────────────────────────────

#[test]
fn finds_matching_declarer() {
    let declarers = vec![fixed("a"), fixed("b"), fixed("c")];
    let found = get_by_id("b", &declarers).unwrap();
    assert_eq!(found.declare_model().id(), "b");
}

#[test]
fn empty_collection_yields_none() {
    let declarers: Vec<Fixed> = Vec::new();
    assert!(get_by_id("a", &declarers).is_none());
}

#[test]
fn no_match_yields_none() {
    let declarers = vec![fixed("a"), fixed("b")];
    assert!(get_by_id("c", &declarers).is_none());
}

#[test]
fn comparison_is_exact() {
    let declarers = vec![fixed("org.sluice.Sink")];
    assert!(get_by_id("org.sluice.sink", &declarers).is_none());
    assert!(get_by_id("org.sluice.Sink ", &declarers).is_none());
    assert!(get_by_id("org.sluice.Sink", &declarers).is_some());
}

#[test]
fn duplicates_return_first_in_order() {
    let first = Fixed(
        sluice_model::ElementDescriptionBuilder::sink("dup", "First", "")
            .build()
            .unwrap(),
    );
    let second = Fixed(
        sluice_model::ElementDescriptionBuilder::sink("dup", "Second", "")
            .build()
            .unwrap(),
    );
    let declarers = vec![first, second];
    let found = get_by_id("dup", &declarers).unwrap();
    assert_eq!(found.declare_model().name(), "First");
}

#[test]
fn works_over_trait_objects() {
    let declarers: Vec<Box<dyn Declarer>> = vec![
        Box::new(fixed("a")),
        Box::new(VectorStoreSink::new().unwrap()),
    ];
    let found = get_by_id(VectorStoreSink::ELEMENT_ID, declarers.iter().map(|d| d.as_ref()));
    assert!(found.is_some());
}

// ── ElementRegistry ─────────────────────────────────────────────

#[test]
fn registry_lookup_and_descriptions() {
    init_tracing();
    let registry: ElementRegistry = ElementRegistry::new(vec![
        Arc::new(fixed("a")) as Arc<dyn Declarer>,
        Arc::new(VectorStoreSink::new().unwrap()),
    ]);

    assert_eq!(registry.len(), 2);
    assert!(!registry.is_empty());
    let sink = registry.get_by_id(VectorStoreSink::ELEMENT_ID).unwrap();
    assert_eq!(sink.declare_model().id(), VectorStoreSink::ELEMENT_ID);
    assert!(registry.get_by_id("missing").is_none());

    let ids: Vec<String> = registry
        .descriptions()
        .iter()
        .map(|d| d.id().to_string())
        .collect();
    assert_eq!(ids, vec!["a".to_string(), VectorStoreSink::ELEMENT_ID.to_string()]);
}

#[test]
fn registry_reports_duplicates_once() {
    let registry = ElementRegistry::new(vec![
        Arc::new(fixed("x")),
        Arc::new(fixed("y")),
        Arc::new(fixed("x")),
        Arc::new(fixed("x")),
    ]);
    assert_eq!(registry.duplicate_ids(), vec!["x".to_string()]);
}

#[test]
fn empty_registry() {
    let registry: ElementRegistry<Fixed> = ElementRegistry::new(Vec::new());
    assert!(registry.is_empty());
    assert!(registry.get_by_id("a").is_none());
    assert!(registry.duplicate_ids().is_empty());
}

// ── Properties ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn lookup_is_position_independent(
        ids in proptest::collection::hash_set("[a-z]{1,8}", 1..12),
        pick in any::<prop::sample::Index>(),
    ) {
        let ids: Vec<String> = ids.into_iter().collect();
        let target = pick.get(&ids).clone();
        let declarers: Vec<Fixed> = ids.iter().map(|id| fixed(id)).collect();

        let found = get_by_id(&target, &declarers);
        prop_assert!(found.is_some());
        let model = found.unwrap().declare_model();
        prop_assert_eq!(model.id(), target.as_str());

        let matches = declarers
            .iter()
            .filter(|d| d.declare_model().id() == target)
            .count();
        prop_assert_eq!(matches, 1);
    }

    #[test]
    fn unknown_id_is_never_found(ids in proptest::collection::vec("[a-z]{1,8}", 0..12)) {
        let declarers: Vec<Fixed> = ids.iter().map(|id| fixed(id)).collect();
        prop_assert!(get_by_id("UNKNOWN", &declarers).is_none());
    }
}
