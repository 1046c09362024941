#![allow(dead_code)]

use sluice_model::{ElementDescription, ElementDescriptionBuilder, EventProperty, EventSchema, xsd};
use sluice_runtime::client::mock::MockFactory;
use sluice_runtime::sink::{
    COLLECTION_NAME_KEY, DATABASE_KEY, URI_KEY, VECTOR_KEY, VectorStoreSink,
};
use sluice_runtime::{Declarer, InvocationLifecycle, RawParameters, RuntimeConfig};
use serde_json::json;
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Declarer returning a fixed description.
pub struct Fixed(pub ElementDescription);

impl Declarer for Fixed {
    fn declare_model(&self) -> ElementDescription {
        self.0.clone()
    }
}

pub fn fixed(id: &str) -> Fixed {
    Fixed(
        ElementDescriptionBuilder::sink(id, id, "test element")
            .build()
            .unwrap(),
    )
}

/// `{ id: string, embedding: [double], meta: { score: float, ok: boolean } }`
pub fn vector_schema() -> EventSchema {
    EventSchema::new(vec![
        EventProperty::primitive("id", xsd::STRING),
        EventProperty::list("embedding", EventProperty::primitive("value", xsd::DOUBLE)),
        EventProperty::nested(
            "meta",
            vec![
                EventProperty::primitive("score", xsd::FLOAT),
                EventProperty::primitive("ok", xsd::BOOLEAN),
            ],
        ),
    ])
}

pub fn vector_parameters() -> RawParameters {
    RawParameters::from([
        (URI_KEY.to_string(), json!("http://vectors:19530")),
        (DATABASE_KEY.to_string(), json!("analytics")),
        (COLLECTION_NAME_KEY.to_string(), json!("embeddings")),
        (VECTOR_KEY.to_string(), json!("s0::embedding")),
    ])
}

pub fn vector_lifecycle(
    config: RuntimeConfig,
) -> (InvocationLifecycle<VectorStoreSink, MockFactory>, Arc<MockFactory>) {
    let factory = Arc::new(MockFactory::new());
    let sink = VectorStoreSink::new().unwrap();
    (
        InvocationLifecycle::new(sink, Arc::clone(&factory), config),
        factory,
    )
}

/// `unwrap_err` for results whose success type has no `Debug`.
pub fn expect_err<T>(result: Result<T, sluice_runtime::ElementError>) -> sluice_runtime::ElementError {
    match result {
        Ok(_) => panic!("expected an error"),
        Err(e) => e,
    }
}
