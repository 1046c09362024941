use serde::{Deserialize, Serialize};

/// The immutable, declarative model of one pipeline element.
///
/// Produced once by a declarer (usually through
/// [`ElementDescriptionBuilder`](crate::ElementDescriptionBuilder)) and only
/// read afterwards, so all fields are private behind accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescription {
    id: String,
    name: String,
    description: String,
    kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    category: Vec<String>,
    #[serde(default)]
    static_properties: Vec<StaticProperty>,
    #[serde(default)]
    stream_requirements: Vec<StreamRequirement>,
}

impl ElementDescription {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        name: String,
        description: String,
        kind: ElementKind,
        icon: Option<String>,
        category: Vec<String>,
        static_properties: Vec<StaticProperty>,
        stream_requirements: Vec<StreamRequirement>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            kind,
            icon,
            category,
            static_properties,
            stream_requirements,
        }
    }

    /// Globally unique element identifier (e.g. "org.sluice.sinks.vectorstore").
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn category(&self) -> &[String] {
        &self.category
    }

    /// Declared configuration options, in declaration order.
    pub fn static_properties(&self) -> &[StaticProperty] {
        &self.static_properties
    }

    pub fn stream_requirements(&self) -> &[StreamRequirement] {
        &self.stream_requirements
    }

    /// Looks up a declared option by its identifier.
    pub fn static_property(&self, option_id: &str) -> Option<&StaticProperty> {
        self.static_properties.iter().find(|p| p.id() == option_id)
    }

    /// All mapping-type options, in declaration order.
    pub fn mapping_properties(&self) -> impl Iterator<Item = &MappingProperty> {
        self.static_properties.iter().filter_map(|p| match p {
            StaticProperty::MappingUnary(m) => Some(m),
            StaticProperty::FreeText(_) => None,
        })
    }
}

/// Role of an element inside a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Source,
    Processor,
    Sink,
}

/// Identifier plus human-readable text of an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Label {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Label whose display name is the identifier itself.
    pub fn with_id(id: &str) -> Self {
        Self::new(id, id, "")
    }
}

/// One declared configuration option of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StaticProperty {
    /// A scalar value typed in by the user.
    FreeText(FreeTextProperty),
    /// Selects exactly one field of the input stream.
    MappingUnary(MappingProperty),
}

impl StaticProperty {
    pub fn id(&self) -> &str {
        &self.label().id
    }

    pub fn label(&self) -> &Label {
        match self {
            Self::FreeText(p) => &p.label,
            Self::MappingUnary(p) => &p.label,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            Self::FreeText(p) => p.required,
            Self::MappingUnary(p) => p.required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeTextProperty {
    pub label: Label,
    pub value_type: ValueType,
    pub required: bool,
    /// Used when the caller supplies no value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingProperty {
    pub label: Label,
    /// Constraint the selected field must satisfy.
    pub requirement: PropertyRequirement,
    pub required: bool,
}

/// Scalar type a free-text option is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Text,
    Integer,
    Float,
    Boolean,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }
}

/// Constraint on the event property a mapping option may select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyRequirement {
    #[default]
    Any,
    Number,
    Text,
    Boolean,
}

impl std::fmt::Display for PropertyRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Any => "any",
            Self::Number => "number",
            Self::Text => "text",
            Self::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

/// Properties an input stream must provide for the element to be connectable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequirement {
    pub required_properties: Vec<PropertyRequirement>,
}
