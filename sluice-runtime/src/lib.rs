//! Element resolution and invocation lifecycle for Sluice pipeline elements.
//!
//! A bootstrap step registers declarers in an [`ElementRegistry`] and
//! protocol/data format definitions in a [`ProtocolResolver`]. A caller looks
//! up an element by id, collects parameters, and drives an
//! [`InvocationLifecycle`]: parameters are bound by the
//! [`ParameterExtractor`], the input schema is flattened into a
//! [`FieldLayout`], a client is borrowed from a bounded [`ClientPool`], and
//! the remote structures are created before events are accepted.
//!
//! The remote system is abstracted behind [`RemoteClient`] and
//! [`ClientFactory`]; [`client::mock`] provides an in-memory implementation
//! that records every call.

pub mod client;
mod config;
mod declarer;
mod error;
mod extractor;
mod flatten;
mod lifecycle;
mod pool;
mod protocol;
mod registry;
pub mod sink;
mod type_mapper;

pub use client::{ClientFactory, CollectionSpec, ConnectConfig, NamespaceSpec, Record, RemoteClient};
pub use config::{ConfigError, RuntimeConfig, SinkConfig};
pub use declarer::{Declarer, InvocableDeclarer, RuntimeContext, SinkDeclarer, SinkTarget};
pub use error::{ElementError, ElementResult, ErrorKind, RemoteError};
pub use extractor::{
    BoundValue, ParameterExtractor, ParameterValue, RawParameters, ResolvedMapping,
    RuntimeParameters,
};
pub use flatten::{flatten, flatten_property, FieldLayout};
pub use lifecycle::{InvocationHandle, InvocationLifecycle, InvocationState, ReleasePolicy};
pub use pool::{ClientPool, PoolConfig, PooledClient};
pub use protocol::{
    DataFormatDefinition, JsonDataFormat, KafkaProtocol, KafkaProtocolDefinition, MqttProtocol,
    MqttProtocolDefinition, NatsProtocol, NatsProtocolDefinition, ProtocolDefinition,
    ProtocolResolver, ProtocolResolverBuilder, StreamBinding, TransportProtocol,
};
pub use registry::{get_by_id, ElementRegistry};
pub use sink::VectorStoreSink;
pub use type_mapper::{map_runtime_type, map_type};
