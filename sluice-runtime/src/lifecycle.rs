//! Declare, configure, run and detach one sink invocation.
//!
//! ```text
//! Declared ──invoke──▶ Configuring ──ok──▶ Running ──detach──▶ Detached
//!    ▲                     │
//!    └────────error────────┘
//! ```
//!
//! All configuration checks run before the first remote call. Once remote
//! setup has started, any failure returns the borrowed client and closes the
//! pool before the error is reported, so no half-open `Running` state is ever
//! observable.

use crate::client::{ClientFactory, CollectionSpec, Record, RemoteClient};
use crate::config::RuntimeConfig;
use crate::declarer::{Declarer, InvocableDeclarer, RuntimeContext, SinkDeclarer, SinkTarget};
use crate::error::{ElementError, ElementResult, RemoteError};
use crate::extractor::{ParameterExtractor, RawParameters, RuntimeParameters};
use crate::flatten::FieldLayout;
use crate::pool::{ClientPool, PooledClient};
use crate::protocol::StreamBinding;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_model::{ElementDescription, Event, EventSchema};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Declared,
    Configuring,
    Running,
    /// Terminal.
    Detached,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Declared => "declared",
            Self::Configuring => "configuring",
            Self::Running => "running",
            Self::Detached => "detached",
        })
    }
}

/// What happens to the target collection after each write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleasePolicy {
    /// Release the collection after every insert. The remote reloads it on
    /// the next write.
    #[default]
    AfterWrite,
    /// Keep the collection loaded until detach.
    KeepLoaded,
}

/// Resources owned by a running invocation.
pub struct InvocationHandle<F: ClientFactory> {
    invocation_id: Uuid,
    target: SinkTarget,
    layout: FieldLayout,
    parameters: RuntimeParameters,
    pool: Arc<ClientPool<F>>,
    client: PooledClient<F::Client>,
}

impl<F: ClientFactory> InvocationHandle<F> {
    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn target(&self) -> &SinkTarget {
        &self.target
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    pub fn parameters(&self) -> &RuntimeParameters {
        &self.parameters
    }

    pub fn pool(&self) -> &ClientPool<F> {
        &self.pool
    }

    /// One record holding the value of every resolved mapping.
    fn record(&self, event: &Event) -> ElementResult<Record> {
        let mut record = Record::new();
        for mapping in self.parameters.mappings() {
            let value = event
                .get(&mapping.selector)
                .ok_or_else(|| ElementError::SelectorMiss {
                    selector: mapping.selector.to_string(),
                })?;
            record.insert(mapping.field_name.clone(), value.clone());
        }
        Ok(record)
    }
}

/// Drives a [`SinkDeclarer`] against a remote system reached through `F`.
pub struct InvocationLifecycle<S, F: ClientFactory> {
    sink: S,
    factory: Arc<F>,
    config: RuntimeConfig,
    binding: Option<StreamBinding>,
    state: InvocationState,
    handle: Option<InvocationHandle<F>>,
}

impl<S: SinkDeclarer, F: ClientFactory> InvocationLifecycle<S, F> {
    pub fn new(sink: S, factory: Arc<F>, config: RuntimeConfig) -> Self {
        Self {
            sink,
            factory,
            config,
            binding: None,
            state: InvocationState::Declared,
            handle: None,
        }
    }

    /// Attaches the inbound stream binding used by [`Self::on_payload`].
    pub fn with_binding(mut self, binding: StreamBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    pub fn handle(&self) -> Option<&InvocationHandle<F>> {
        self.handle.as_ref()
    }

    pub fn description(&self) -> ElementDescription {
        self.sink.declare_model()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn ensure_running(&self, operation: &'static str) -> ElementResult<&InvocationHandle<F>> {
        match (self.state, self.handle.as_ref()) {
            (InvocationState::Running, Some(handle)) => Ok(handle),
            (state, _) => Err(ElementError::InvalidState { operation, state }),
        }
    }

    /// Binds parameters, lays out the collection, and opens the remote side.
    pub async fn invoke(
        &mut self,
        parameters: &RawParameters,
        context: RuntimeContext,
    ) -> ElementResult<&InvocationHandle<F>> {
        if self.state != InvocationState::Declared {
            return Err(ElementError::InvalidState {
                operation: "invoke",
                state: self.state,
            });
        }
        self.state = InvocationState::Configuring;
        let description = self.sink.declare_model();
        let invocation_id = context.invocation_id;

        let (bound, target, layout) =
            match self.configure(&description, parameters, &context.input_schema) {
                Ok(configured) => configured,
                Err(e) => {
                    self.state = InvocationState::Declared;
                    warn!(element_id = %description.id(), %invocation_id, error = %e, "Invocation rejected");
                    return Err(e);
                }
            };

        let pool = Arc::new(ClientPool::new(
            Arc::clone(&self.factory),
            target.connect.clone(),
            self.config.pool.clone(),
        ));
        let client = match Self::open(&pool, &target, &layout).await {
            Ok(client) => client,
            Err(e) => {
                if let Err(close_err) = pool.close().await {
                    warn!(%invocation_id, error = %close_err, "Failed to close pool after setup error");
                }
                self.state = InvocationState::Declared;
                warn!(element_id = %description.id(), %invocation_id, error = %e, "Invocation failed");
                return Err(e);
            }
        };

        self.state = InvocationState::Running;
        info!(
            element_id = %description.id(),
            %invocation_id,
            collection = %target.collection,
            fields = layout.len(),
            "Invocation running"
        );
        Ok(&*self.handle.insert(InvocationHandle {
            invocation_id,
            target,
            layout,
            parameters: bound,
            pool,
            client,
        }))
    }

    fn configure(
        &self,
        description: &ElementDescription,
        parameters: &RawParameters,
        schema: &EventSchema,
    ) -> ElementResult<(RuntimeParameters, SinkTarget, FieldLayout)> {
        let bound = ParameterExtractor::new(description, parameters, schema).bind_all()?;
        let target = self.sink.target(&bound)?;
        let layout = FieldLayout::from_schema(schema)?;
        Ok((bound, target, layout))
    }

    async fn open(
        pool: &ClientPool<F>,
        target: &SinkTarget,
        layout: &FieldLayout,
    ) -> ElementResult<PooledClient<F::Client>> {
        let mut client = pool.acquire(&target.pool_key).await?;
        if let Err(e) = Self::create_structures(&mut client, target, layout).await {
            if let Err(release_err) = pool.release(client).await {
                warn!(key = %target.pool_key, error = %release_err, "Failed to return client after setup error");
            }
            return Err(e);
        }
        Ok(client)
    }

    async fn create_structures(
        client: &mut F::Client,
        target: &SinkTarget,
        layout: &FieldLayout,
    ) -> ElementResult<()> {
        if let Some(namespace) = &target.namespace {
            tolerate_existing(
                client.create_namespace(namespace).await,
                "namespace",
                &namespace.name,
            )?;
            client
                .use_namespace(&namespace.name)
                .await
                .map_err(|source| ElementError::Setup {
                    structure: "namespace",
                    name: namespace.name.clone(),
                    source,
                })?;
        }
        let spec = CollectionSpec {
            name: target.collection.clone(),
            fields: layout.fields().to_vec(),
        };
        tolerate_existing(client.create_collection(&spec).await, "collection", &spec.name)
    }

    /// Writes the mapped values of `event` as one record.
    pub async fn on_event(&mut self, event: &Event) -> ElementResult<()> {
        let policy = self.config.sink.release_policy;
        let handle = self.ensure_running("process event")?;
        let record = handle.record(event)?;
        let collection = handle.target.collection.as_str();

        handle
            .client
            .insert(collection, record)
            .await
            .map_err(|source| ElementError::Write {
                collection: collection.to_string(),
                source,
            })?;
        debug!(invocation_id = %handle.invocation_id, collection = %collection, "Record written");

        if policy == ReleasePolicy::AfterWrite {
            handle
                .client
                .release_collection(collection)
                .await
                .map_err(|source| ElementError::ReleaseAfterWrite {
                    collection: collection.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Decodes `payload` with the attached binding, then handles it as an event.
    pub async fn on_payload(&mut self, payload: &[u8]) -> ElementResult<()> {
        self.ensure_running("process payload")?;
        let binding = self.binding.as_ref().ok_or(ElementError::MissingDataFormat)?;
        let event = binding.decode(payload)?;
        self.on_event(&event).await
    }

    /// Returns the client to its pool, then closes the pool. Detaching twice
    /// is a no-op.
    pub async fn detach(&mut self) -> ElementResult<()> {
        match self.state {
            InvocationState::Running => {}
            InvocationState::Detached => {
                debug!("Already detached");
                return Ok(());
            }
            state => {
                return Err(ElementError::InvalidState {
                    operation: "detach",
                    state,
                });
            }
        }
        self.state = InvocationState::Detached;
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let InvocationHandle {
            invocation_id,
            target,
            pool,
            client,
            ..
        } = handle;

        let released = pool.release(client).await;
        let closed = pool.close().await;
        match released.and(closed) {
            Ok(()) => {
                info!(%invocation_id, collection = %target.collection, "Invocation detached");
                Ok(())
            }
            Err(e) => {
                warn!(%invocation_id, error = %e, "Detached with release errors");
                Err(ElementError::Release(e))
            }
        }
    }
}

fn tolerate_existing(
    result: Result<(), RemoteError>,
    structure: &'static str,
    name: &str,
) -> ElementResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(RemoteError::AlreadyExists(_)) => {
            debug!(structure, name = %name, "Already exists, reusing");
            Ok(())
        }
        Err(source) => Err(ElementError::Setup {
            structure,
            name: name.to_string(),
            source,
        }),
    }
}

impl<S: SinkDeclarer, F: ClientFactory> Declarer for InvocationLifecycle<S, F> {
    fn declare_model(&self) -> ElementDescription {
        self.sink.declare_model()
    }
}

#[async_trait]
impl<S: SinkDeclarer, F: ClientFactory> InvocableDeclarer for InvocationLifecycle<S, F> {
    async fn invoke(
        &mut self,
        parameters: &RawParameters,
        context: RuntimeContext,
    ) -> ElementResult<()> {
        InvocationLifecycle::invoke(self, parameters, context)
            .await
            .map(|_| ())
    }

    async fn on_event(&mut self, event: &Event) -> ElementResult<()> {
        InvocationLifecycle::on_event(self, event).await
    }

    async fn detach(&mut self) -> ElementResult<()> {
        InvocationLifecycle::detach(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_policy_uses_kebab_case() {
        let json = serde_json::to_string(&ReleasePolicy::KeepLoaded).unwrap();
        assert_eq!(json, "\"keep-loaded\"");
        assert_eq!(ReleasePolicy::default(), ReleasePolicy::AfterWrite);
    }

    #[test]
    fn state_display() {
        assert_eq!(InvocationState::Running.to_string(), "running");
        assert_eq!(InvocationState::Detached.to_string(), "detached");
    }
}
