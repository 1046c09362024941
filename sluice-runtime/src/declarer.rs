//! Capability contracts implemented by concrete pipeline elements.
//!
//! [`Declarer`] is all the registry needs. Runtime hooks live on
//! [`InvocableDeclarer`], so lookup never depends on invocation.

use crate::client::{ConnectConfig, NamespaceSpec};
use crate::error::ElementResult;
use crate::extractor::{RawParameters, RuntimeParameters};
use async_trait::async_trait;
use sluice_model::{ElementDescription, Event, EventSchema};
use uuid::Uuid;

/// Provides the description of one pipeline element.
pub trait Declarer: Send + Sync {
    fn declare_model(&self) -> ElementDescription;
}

/// Per-invocation information handed to a declarer alongside its parameters.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// Time-ordered id used to correlate log lines of one invocation.
    pub invocation_id: Uuid,
    pub input_schema: EventSchema,
}

impl RuntimeContext {
    pub fn new(input_schema: EventSchema) -> Self {
        Self {
            invocation_id: Uuid::now_v7(),
            input_schema,
        }
    }
}

/// A declarer that can be bound to a live stream.
#[async_trait]
pub trait InvocableDeclarer: Declarer {
    async fn invoke(
        &mut self,
        parameters: &RawParameters,
        context: RuntimeContext,
    ) -> ElementResult<()>;

    /// Errors propagate to the caller; nothing is retried.
    async fn on_event(&mut self, event: &Event) -> ElementResult<()>;

    async fn detach(&mut self) -> ElementResult<()>;
}

/// A sink whose remote side is driven by [`InvocationLifecycle`](crate::InvocationLifecycle).
pub trait SinkDeclarer: Declarer {
    /// Maps bound parameters to the remote structures the sink writes into.
    fn target(&self, parameters: &RuntimeParameters) -> ElementResult<SinkTarget>;
}

/// Where a sink writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkTarget {
    /// Pool key the client is borrowed under.
    pub pool_key: String,
    pub connect: ConnectConfig,
    /// Namespace (database) to create and switch to before the collection.
    pub namespace: Option<NamespaceSpec>,
    pub collection: String,
}
