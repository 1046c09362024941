//! Fluent builders for element and protocol descriptions.
//!
//! ```
//! use sluice_model::{ElementDescriptionBuilder, Label, PropertyRequirement, StreamRequirementBuilder};
//!
//! let description = ElementDescriptionBuilder::sink("org.example.sink", "Example", "Writes events")
//!     .required_text(Label::with_id("uri"))
//!     .required_stream(
//!         StreamRequirementBuilder::new()
//!             .required_property_with_unary_mapping(PropertyRequirement::Number, Label::with_id("value"))
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(description.static_properties().len(), 2);
//! ```

use crate::{
    ElementDescription, ElementKind, FreeTextProperty, Label, MappingProperty, ModelError,
    PropertyRequirement, ProtocolDescription, Result, SourceType, StaticProperty,
    StreamRequirement, ValueType,
};
use std::collections::HashSet;

fn free_text(label: Label, value_type: ValueType, required: bool, default: Option<String>) -> StaticProperty {
    StaticProperty::FreeText(FreeTextProperty {
        label,
        value_type,
        required,
        default_value: default,
    })
}

fn check_unique(properties: &[StaticProperty]) -> Result<()> {
    let mut seen = HashSet::new();
    for p in properties {
        if !seen.insert(p.id()) {
            return Err(ModelError::DuplicateOption(p.id().to_string()));
        }
    }
    Ok(())
}

/// Builds an [`ElementDescription`].
#[derive(Debug, Clone)]
pub struct ElementDescriptionBuilder {
    id: String,
    name: String,
    description: String,
    kind: ElementKind,
    icon: Option<String>,
    category: Vec<String>,
    properties: Vec<StaticProperty>,
    requirements: Vec<StreamRequirement>,
}

impl ElementDescriptionBuilder {
    pub fn create(kind: ElementKind, id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            kind,
            icon: None,
            category: Vec::new(),
            properties: Vec::new(),
            requirements: Vec::new(),
        }
    }

    pub fn sink(id: &str, name: &str, description: &str) -> Self {
        Self::create(ElementKind::Sink, id, name, description)
    }

    pub fn processor(id: &str, name: &str, description: &str) -> Self {
        Self::create(ElementKind::Processor, id, name, description)
    }

    pub fn source(id: &str, name: &str, description: &str) -> Self {
        Self::create(ElementKind::Source, id, name, description)
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category.push(category.into());
        self
    }

    pub fn required_text(mut self, label: Label) -> Self {
        self.properties.push(free_text(label, ValueType::Text, true, None));
        self
    }

    /// Required text option that falls back to `default` when no value is supplied.
    pub fn required_text_with_default(mut self, label: Label, default: &str) -> Self {
        self.properties
            .push(free_text(label, ValueType::Text, true, Some(default.into())));
        self
    }

    pub fn optional_text(mut self, label: Label) -> Self {
        self.properties.push(free_text(label, ValueType::Text, false, None));
        self
    }

    pub fn required_integer(mut self, label: Label) -> Self {
        self.properties.push(free_text(label, ValueType::Integer, true, None));
        self
    }

    pub fn required_integer_with_default(mut self, label: Label, default: i64) -> Self {
        self.properties.push(free_text(
            label,
            ValueType::Integer,
            true,
            Some(default.to_string()),
        ));
        self
    }

    pub fn required_float(mut self, label: Label) -> Self {
        self.properties.push(free_text(label, ValueType::Float, true, None));
        self
    }

    pub fn required_boolean(mut self, label: Label) -> Self {
        self.properties.push(free_text(label, ValueType::Boolean, true, None));
        self
    }

    /// Adds an input stream requirement together with its mapping options.
    pub fn required_stream(mut self, stream: RequiredStream) -> Self {
        self.properties.extend(
            stream
                .mappings
                .into_iter()
                .map(StaticProperty::MappingUnary),
        );
        self.requirements.push(stream.requirement);
        self
    }

    /// Finishes the description. Fails on an empty id or a repeated option id.
    pub fn build(self) -> Result<ElementDescription> {
        if self.id.is_empty() {
            return Err(ModelError::EmptyId);
        }
        check_unique(&self.properties)?;
        Ok(ElementDescription::new(
            self.id,
            self.name,
            self.description,
            self.kind,
            self.icon,
            self.category,
            self.properties,
            self.requirements,
        ))
    }
}

/// A stream requirement plus the mapping options it introduces.
#[derive(Debug, Clone, Default)]
pub struct RequiredStream {
    requirement: StreamRequirement,
    mappings: Vec<MappingProperty>,
}

#[derive(Debug, Clone, Default)]
pub struct StreamRequirementBuilder {
    inner: RequiredStream,
}

impl StreamRequirementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a property matching `requirement` and lets the user pick it
    /// through a unary mapping option identified by `label`.
    pub fn required_property_with_unary_mapping(
        mut self,
        requirement: PropertyRequirement,
        label: Label,
    ) -> Self {
        self.inner.requirement.required_properties.push(requirement);
        self.inner.mappings.push(MappingProperty {
            label,
            requirement,
            required: true,
        });
        self
    }

    /// Requires a property without exposing a mapping option for it.
    pub fn required_property(mut self, requirement: PropertyRequirement) -> Self {
        self.inner.requirement.required_properties.push(requirement);
        self
    }

    pub fn build(self) -> RequiredStream {
        self.inner
    }
}

/// Builds a [`ProtocolDescription`].
#[derive(Debug, Clone)]
pub struct ProtocolDescriptionBuilder {
    id: String,
    label: String,
    description: String,
    source_type: SourceType,
    config: Vec<StaticProperty>,
}

impl ProtocolDescriptionBuilder {
    pub fn create(id: &str, label: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            source_type: SourceType::default(),
            config: Vec::new(),
        }
    }

    pub fn source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn required_text(mut self, label: Label) -> Self {
        self.config.push(free_text(label, ValueType::Text, true, None));
        self
    }

    pub fn required_integer_with_default(mut self, label: Label, default: i64) -> Self {
        self.config.push(free_text(
            label,
            ValueType::Integer,
            true,
            Some(default.to_string()),
        ));
        self
    }

    pub fn build(self) -> Result<ProtocolDescription> {
        if self.id.is_empty() {
            return Err(ModelError::EmptyId);
        }
        check_unique(&self.config)?;
        Ok(ProtocolDescription::new(
            self.id,
            self.label,
            self.description,
            self.source_type,
            self.config,
        ))
    }
}
