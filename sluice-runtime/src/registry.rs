//! Resolves declared elements by identifier.
//!
//! The declarer collection is populated once at bootstrap and frozen; lookups
//! take `&self` only and need no locking.

use crate::declarer::Declarer;
use sluice_model::ElementDescription;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returns the first declarer, in iteration order, whose model id equals `id`.
///
/// Absence is not an error. Each candidate's `declare_model()` is called until
/// a match is found.
pub fn get_by_id<'a, D>(id: &str, declarers: impl IntoIterator<Item = &'a D>) -> Option<&'a D>
where
    D: Declarer + ?Sized + 'a,
{
    declarers
        .into_iter()
        .find(|declarer| declarer.declare_model().id() == id)
}

/// A frozen, ordered set of declarers.
pub struct ElementRegistry<D: Declarer + ?Sized = dyn Declarer> {
    declarers: Vec<Arc<D>>,
}

impl<D: Declarer + ?Sized> ElementRegistry<D> {
    pub fn new(declarers: Vec<Arc<D>>) -> Self {
        let registry = Self { declarers };
        let duplicates = registry.duplicate_ids();
        if !duplicates.is_empty() {
            warn!(?duplicates, "Duplicate element ids registered; lookups return the first");
        }
        info!(count = registry.declarers.len(), "Element registry frozen");
        registry
    }

    pub fn get_by_id(&self, id: &str) -> Option<Arc<D>> {
        let found = self
            .declarers
            .iter()
            .find(|d| d.declare_model().id() == id)
            .cloned();
        if found.is_none() {
            debug!(element_id = %id, "No declarer matches");
        }
        found
    }

    /// Descriptions of all declarers, in registration order.
    pub fn descriptions(&self) -> Vec<ElementDescription> {
        self.declarers.iter().map(|d| d.declare_model()).collect()
    }

    /// Ids declared by more than one declarer, each reported once.
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for declarer in &self.declarers {
            let id = declarer.declare_model().id().to_string();
            if !seen.insert(id.clone()) && reported.insert(id.clone()) {
                duplicates.push(id);
            }
        }
        duplicates
    }

    pub fn len(&self) -> usize {
        self.declarers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarers.is_empty()
    }
}
