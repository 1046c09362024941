//! Reference sink writing mapped vectors into a vector store.

use crate::client::{ConnectConfig, NamespaceSpec};
use crate::declarer::{Declarer, SinkDeclarer, SinkTarget};
use crate::error::{ElementError, ElementResult};
use crate::extractor::RuntimeParameters;
use sluice_model::{
    ElementDescription, ElementDescriptionBuilder, Label, PropertyRequirement,
    StreamRequirementBuilder,
};
use std::collections::BTreeMap;

pub const URI_KEY: &str = "uri";
pub const TOKEN_KEY: &str = "token";
pub const DATABASE_KEY: &str = "database";
pub const DATABASE_REPLICA_NUMBER_KEY: &str = "database_replica_number";
pub const COLLECTION_NAME_KEY: &str = "collection_name";
pub const VECTOR_KEY: &str = "vector";

/// Namespace property carrying the replica count.
pub const REPLICA_NUMBER_PROPERTY: &str = "database.replica.number";

const DEFAULT_TOKEN: &str = "root:Milvus";
const DEFAULT_REPLICA_NUMBER: i64 = 2;

pub struct VectorStoreSink {
    description: ElementDescription,
}

impl VectorStoreSink {
    pub const ELEMENT_ID: &'static str = "org.sluice.sinks.vectorstore";

    pub fn new() -> sluice_model::Result<Self> {
        let description = ElementDescriptionBuilder::sink(
            Self::ELEMENT_ID,
            "Vector Store",
            "Stores a numeric vector field of each event in a vector database collection",
        )
        .icon("icon.png")
        .category("database")
        .required_text(Label::new(URI_KEY, "URI", "Endpoint of the vector store"))
        .required_text_with_default(
            Label::new(TOKEN_KEY, "Token", "Credentials as user:password"),
            DEFAULT_TOKEN,
        )
        .required_text(Label::new(DATABASE_KEY, "Database", "Database to create and use"))
        .required_integer_with_default(
            Label::new(
                DATABASE_REPLICA_NUMBER_KEY,
                "Replica number",
                "Number of in-memory replicas of the database",
            ),
            DEFAULT_REPLICA_NUMBER,
        )
        .required_text(Label::new(
            COLLECTION_NAME_KEY,
            "Collection",
            "Collection the records are written to",
        ))
        .required_stream(
            StreamRequirementBuilder::new()
                .required_property_with_unary_mapping(
                    PropertyRequirement::Number,
                    Label::new(VECTOR_KEY, "Vector", "Numeric field holding the vector"),
                )
                .build(),
        )
        .build()?;
        Ok(Self { description })
    }
}

impl Declarer for VectorStoreSink {
    fn declare_model(&self) -> ElementDescription {
        self.description.clone()
    }
}

impl SinkDeclarer for VectorStoreSink {
    fn target(&self, parameters: &RuntimeParameters) -> ElementResult<SinkTarget> {
        let uri = parameters.text(URI_KEY)?;
        let replicas = parameters.integer(DATABASE_REPLICA_NUMBER_KEY)?;
        if replicas < 1 {
            return Err(ElementError::InvalidParameter {
                option_id: DATABASE_REPLICA_NUMBER_KEY.to_string(),
                expected: "positive integer",
                detail: replicas.to_string(),
            });
        }

        let mut properties = BTreeMap::new();
        properties.insert(REPLICA_NUMBER_PROPERTY.to_string(), replicas.to_string());

        Ok(SinkTarget {
            pool_key: uri.to_string(),
            connect: ConnectConfig {
                uri: uri.to_string(),
                token: Some(parameters.text(TOKEN_KEY)?.to_string()),
            },
            namespace: Some(NamespaceSpec {
                name: parameters.text(DATABASE_KEY)?.to_string(),
                properties,
            }),
            collection: parameters.text(COLLECTION_NAME_KEY)?.to_string(),
        })
    }
}
