use crate::PropertyRequirement;
use serde::{Deserialize, Serialize};

/// XML Schema datatype URIs used as semantic runtime types.
pub mod xsd {
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}

/// Schema of the events on one input stream. Child order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSchema {
    pub properties: Vec<EventProperty>,
}

impl EventSchema {
    pub fn new(properties: Vec<EventProperty>) -> Self {
        Self { properties }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Resolves a runtime-name path (e.g. `["b", "c"]`) to the property it names.
    ///
    /// List properties are transparent: a path continues into the list's
    /// element as if it were a single occurrence.
    pub fn property_at<S: AsRef<str>>(&self, path: &[S]) -> Option<&EventProperty> {
        let (first, rest) = path.split_first()?;
        let mut current = self
            .properties
            .iter()
            .find(|p| p.runtime_name() == first.as_ref())?;
        for segment in rest {
            current = current.child(segment.as_ref())?;
        }
        Some(current)
    }
}

/// One node of an event schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventProperty {
    Primitive {
        runtime_name: String,
        /// Semantic type, usually an XSD datatype URI (see [`xsd`]).
        runtime_type: String,
    },
    Nested {
        runtime_name: String,
        properties: Vec<EventProperty>,
    },
    List {
        runtime_name: String,
        element: Box<EventProperty>,
    },
}

impl EventProperty {
    pub fn primitive(name: &str, runtime_type: &str) -> Self {
        Self::Primitive {
            runtime_name: name.into(),
            runtime_type: runtime_type.into(),
        }
    }

    pub fn nested(name: &str, properties: Vec<EventProperty>) -> Self {
        Self::Nested {
            runtime_name: name.into(),
            properties,
        }
    }

    /// List whose elements look like `element`. The element's own name is not
    /// part of any path.
    pub fn list(name: &str, element: EventProperty) -> Self {
        Self::List {
            runtime_name: name.into(),
            element: Box::new(element),
        }
    }

    pub fn runtime_name(&self) -> &str {
        match self {
            Self::Primitive { runtime_name, .. }
            | Self::Nested { runtime_name, .. }
            | Self::List { runtime_name, .. } => runtime_name,
        }
    }

    /// Parsed semantic type of a primitive node; `None` for nested and list nodes.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Self::Primitive { runtime_type, .. } => Some(PrimitiveType::parse(runtime_type)),
            _ => None,
        }
    }

    fn child(&self, name: &str) -> Option<&EventProperty> {
        match self {
            Self::Primitive { .. } => None,
            Self::Nested { properties, .. } => properties.iter().find(|p| p.runtime_name() == name),
            Self::List { element, .. } => element.child(name),
        }
    }

    /// Whether this property may be selected by a mapping with `requirement`.
    /// A list satisfies whatever its element satisfies.
    pub fn satisfies(&self, requirement: PropertyRequirement) -> bool {
        if requirement == PropertyRequirement::Any {
            return true;
        }
        match self {
            Self::Primitive { .. } => {
                let Some(ty) = self.primitive_type() else {
                    return false;
                };
                match requirement {
                    PropertyRequirement::Number => ty.is_numeric(),
                    PropertyRequirement::Text => ty == PrimitiveType::String,
                    PropertyRequirement::Boolean => ty == PrimitiveType::Boolean,
                    PropertyRequirement::Any => true,
                }
            }
            Self::Nested { .. } => false,
            Self::List { element, .. } => element.satisfies(requirement),
        }
    }
}

/// Semantic primitive type of a schema leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    String,
    /// Any tag not recognised above, kept verbatim.
    Other(String),
}

impl PrimitiveType {
    /// Parses a full XSD URI, an `xsd:` prefixed name, or a bare local name.
    pub fn parse(runtime_type: &str) -> Self {
        let local = runtime_type
            .strip_prefix(xsd::NAMESPACE)
            .or_else(|| runtime_type.strip_prefix("xsd:"))
            .unwrap_or(runtime_type);
        match local {
            "integer" | "int" => Self::Integer,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "boolean" => Self::Boolean,
            "string" => Self::String,
            _ => Self::Other(runtime_type.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Long | Self::Float | Self::Double)
    }
}
