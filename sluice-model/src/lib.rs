//! Declarative model for Sluice pipeline elements.
//!
//! Defines the types every element implementation and the runtime share:
//! - [`ElementDescription`]: the immutable, self-describing model of a source,
//!   processor or sink (identity, configuration options, stream requirements)
//! - [`StaticProperty`]: one declared configuration option (free text or mapping)
//! - [`ProtocolDescription`]: the self-description of a transport protocol
//! - [`EventSchema`] / [`EventProperty`]: the nested schema of an input stream
//! - [`Event`] / [`FieldSelector`]: runtime records and paths into them
//! - [`FlattenedField`] / [`ExternalFieldType`]: a schema leaf projected onto
//!   an external system's flat field model
//!
//! Descriptions are produced through the builders in [`builder`] and are never
//! mutated afterwards.

pub mod builder;
mod description;
mod event;
mod field;
mod protocol;
mod schema;

pub use builder::{
    ElementDescriptionBuilder, ProtocolDescriptionBuilder, RequiredStream, StreamRequirementBuilder,
};
pub use description::{
    ElementDescription, ElementKind, FreeTextProperty, Label, MappingProperty, PropertyRequirement,
    StaticProperty, StreamRequirement, ValueType,
};
pub use event::{Event, FieldSelector};
pub use field::{ExternalFieldType, FlattenedField, FIELD_SEPARATOR};
pub use protocol::{ProtocolDescription, SourceType};
pub use schema::{xsd, EventProperty, EventSchema, PrimitiveType};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while constructing or parsing model values.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("element id must not be empty")]
    EmptyId,

    #[error("option '{0}' declared more than once")]
    DuplicateOption(String),

    #[error("invalid field selector '{0}'")]
    InvalidSelector(String),

    #[error("event payload must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
