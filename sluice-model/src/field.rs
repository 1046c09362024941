use serde::{Deserialize, Serialize};

/// Joins ancestor names when a nested schema is flattened.
pub const FIELD_SEPARATOR: &str = "_";

/// Field type in the external system's flat field model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalFieldType {
    Int32,
    Int64,
    Float,
    Double,
    Bool,
    String,
}

/// One schema leaf projected to a name/type pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlattenedField {
    pub name: String,
    pub field_type: ExternalFieldType,
}

impl FlattenedField {
    pub fn new(name: impl Into<String>, field_type: ExternalFieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}
