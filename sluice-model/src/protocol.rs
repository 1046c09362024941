use crate::StaticProperty;
use serde::{Deserialize, Serialize};

/// Self-description of a transport protocol an adapter can read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDescription {
    id: String,
    label: String,
    description: String,
    source_type: SourceType,
    #[serde(default)]
    config: Vec<StaticProperty>,
}

impl ProtocolDescription {
    pub(crate) fn new(
        id: String,
        label: String,
        description: String,
        source_type: SourceType,
        config: Vec<StaticProperty>,
    ) -> Self {
        Self {
            id,
            label,
            description,
            source_type,
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn config(&self) -> &[StaticProperty] {
        &self.config
    }
}

/// Whether a protocol yields an unbounded stream or a finite set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Stream,
    Set,
}
