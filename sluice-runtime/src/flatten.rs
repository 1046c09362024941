//! Projects a nested event schema onto a flat field model.
//!
//! Traversal is pre-order in document order. Nested nodes contribute only
//! their name to the prefix of their children. A list node is flattened as
//! if it held a single occurrence of its element: a list of primitives
//! becomes one field named after the list, a list of nested nodes yields one
//! field per leaf under the list's name. The element node's own name is
//! never used, and no array field type is introduced.

use crate::error::{ElementError, ElementResult};
use crate::type_mapper::map_runtime_type;
use sluice_model::{EventProperty, EventSchema, FlattenedField, FIELD_SEPARATOR};
use std::collections::HashSet;

/// Flattens `properties`, prefixing every emitted name with `prefix`.
pub fn flatten(properties: &[EventProperty], prefix: &str) -> Vec<FlattenedField> {
    let mut out = Vec::new();
    for property in properties {
        flatten_into(property, prefix, &mut out);
    }
    out
}

/// Flattens a single node.
pub fn flatten_property(property: &EventProperty, prefix: &str) -> Vec<FlattenedField> {
    let mut out = Vec::new();
    flatten_into(property, prefix, &mut out);
    out
}

fn flatten_into(property: &EventProperty, prefix: &str, out: &mut Vec<FlattenedField>) {
    match property {
        EventProperty::Primitive {
            runtime_name,
            runtime_type,
        } => out.push(FlattenedField::new(
            format!("{prefix}{runtime_name}"),
            map_runtime_type(runtime_type),
        )),
        EventProperty::Nested {
            runtime_name,
            properties,
        } => {
            let child_prefix = format!("{prefix}{runtime_name}{FIELD_SEPARATOR}");
            for child in properties {
                flatten_into(child, &child_prefix, out);
            }
        }
        EventProperty::List {
            runtime_name,
            element,
        } => flatten_element(&format!("{prefix}{runtime_name}"), element, out),
    }
}

fn flatten_element(name: &str, element: &EventProperty, out: &mut Vec<FlattenedField>) {
    match element {
        EventProperty::Primitive { runtime_type, .. } => {
            out.push(FlattenedField::new(name, map_runtime_type(runtime_type)))
        }
        EventProperty::Nested { properties, .. } => {
            let child_prefix = format!("{name}{FIELD_SEPARATOR}");
            for child in properties {
                flatten_into(child, &child_prefix, out);
            }
        }
        EventProperty::List { element, .. } => flatten_element(name, element, out),
    }
}

/// Validated flat field layout of one input schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLayout {
    fields: Vec<FlattenedField>,
}

impl FieldLayout {
    /// Flattens `schema` and rejects layouts where two leaves collapse to the
    /// same name (e.g. a top-level `a_b` next to nested `a { b }`).
    pub fn from_schema(schema: &EventSchema) -> ElementResult<Self> {
        let fields = flatten(&schema.properties, "");
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ElementError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FlattenedField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FlattenedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
