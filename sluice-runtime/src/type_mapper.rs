//! Semantic primitive type to external field type.

use sluice_model::{ExternalFieldType, PrimitiveType};

/// Total mapping; anything that is not a known numeric or boolean type is
/// stored as a string.
pub fn map_type(ty: &PrimitiveType) -> ExternalFieldType {
    match ty {
        PrimitiveType::Integer => ExternalFieldType::Int32,
        PrimitiveType::Long => ExternalFieldType::Int64,
        PrimitiveType::Float => ExternalFieldType::Float,
        PrimitiveType::Double => ExternalFieldType::Double,
        PrimitiveType::Boolean => ExternalFieldType::Bool,
        PrimitiveType::String | PrimitiveType::Other(_) => ExternalFieldType::String,
    }
}

/// Maps a raw runtime type tag (XSD URI, `xsd:` name, or bare name).
pub fn map_runtime_type(runtime_type: &str) -> ExternalFieldType {
    map_type(&PrimitiveType::parse(runtime_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_model::xsd;

    #[test]
    fn known_types() {
        assert_eq!(map_runtime_type(xsd::INTEGER), ExternalFieldType::Int32);
        assert_eq!(map_runtime_type(xsd::LONG), ExternalFieldType::Int64);
        assert_eq!(map_runtime_type(xsd::FLOAT), ExternalFieldType::Float);
        assert_eq!(map_runtime_type(xsd::DOUBLE), ExternalFieldType::Double);
        assert_eq!(map_runtime_type(xsd::BOOLEAN), ExternalFieldType::Bool);
        assert_eq!(map_runtime_type(xsd::STRING), ExternalFieldType::String);
    }

    #[test]
    fn unknown_defaults_to_string() {
        assert_eq!(map_runtime_type(""), ExternalFieldType::String);
        assert_eq!(map_runtime_type("xsd:dateTime"), ExternalFieldType::String);
        assert_eq!(
            map_type(&PrimitiveType::Other("http://schema.org/Number".into())),
            ExternalFieldType::String
        );
    }
}
