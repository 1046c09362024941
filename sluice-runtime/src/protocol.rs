//! Transport protocol and data format resolution.
//!
//! Definitions are registered once through [`ProtocolResolverBuilder`] during
//! bootstrap. The built [`ProtocolResolver`] is immutable and is passed
//! explicitly to whoever needs it.

use crate::error::{ElementError, ElementResult};
use sluice_model::{Event, Label, ProtocolDescription, ProtocolDescriptionBuilder};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A concrete transport descriptor, such as a Kafka topic on a broker.
pub trait TransportProtocol: Any + Send + Sync + fmt::Debug {
    fn topic(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Knows how to talk to one kind of [`TransportProtocol`].
pub trait ProtocolDefinition: Send + Sync {
    fn describe(&self) -> &ProtocolDescription;

    fn id(&self) -> &str {
        self.describe().id()
    }

    /// Connection string for `protocol`, or `None` if it is another kind.
    fn endpoint(&self, protocol: &dyn TransportProtocol) -> Option<String>;
}

/// Serializes events to and from transport payloads.
pub trait DataFormatDefinition: Send + Sync {
    fn id(&self) -> &str;

    fn decode(&self, payload: &[u8]) -> ElementResult<Event>;

    fn encode(&self, event: &Event) -> ElementResult<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaProtocol {
    pub broker_hostname: String,
    pub port: u16,
    pub topic: String,
}

impl TransportProtocol for KafkaProtocol {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttProtocol {
    pub broker_hostname: String,
    pub port: u16,
    pub topic: String,
}

impl TransportProtocol for MqttProtocol {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatsProtocol {
    pub server_urls: Vec<String>,
    pub subject: String,
}

impl TransportProtocol for NatsProtocol {
    fn topic(&self) -> &str {
        &self.subject
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn broker_description(
    id: &str,
    label: &str,
    description: &str,
    port: i64,
) -> sluice_model::Result<ProtocolDescription> {
    ProtocolDescriptionBuilder::create(id, label, description)
        .required_text(Label::new("host", "Host", "Broker hostname"))
        .required_integer_with_default(Label::new("port", "Port", "Broker port"), port)
        .required_text(Label::new("topic", "Topic", "Topic to subscribe to"))
        .build()
}

pub struct KafkaProtocolDefinition {
    description: ProtocolDescription,
}

impl KafkaProtocolDefinition {
    pub const ID: &'static str = "org.sluice.protocol.kafka";

    pub fn new() -> sluice_model::Result<Self> {
        Ok(Self {
            description: broker_description(
                Self::ID,
                "Apache Kafka",
                "Consumes events from a Kafka topic",
                9092,
            )?,
        })
    }
}

impl ProtocolDefinition for KafkaProtocolDefinition {
    fn describe(&self) -> &ProtocolDescription {
        &self.description
    }

    fn endpoint(&self, protocol: &dyn TransportProtocol) -> Option<String> {
        let kafka = protocol.as_any().downcast_ref::<KafkaProtocol>()?;
        Some(format!("{}:{}", kafka.broker_hostname, kafka.port))
    }
}

pub struct MqttProtocolDefinition {
    description: ProtocolDescription,
}

impl MqttProtocolDefinition {
    pub const ID: &'static str = "org.sluice.protocol.mqtt";

    pub fn new() -> sluice_model::Result<Self> {
        Ok(Self {
            description: broker_description(
                Self::ID,
                "MQTT",
                "Consumes events from an MQTT broker",
                1883,
            )?,
        })
    }
}

impl ProtocolDefinition for MqttProtocolDefinition {
    fn describe(&self) -> &ProtocolDescription {
        &self.description
    }

    fn endpoint(&self, protocol: &dyn TransportProtocol) -> Option<String> {
        let mqtt = protocol.as_any().downcast_ref::<MqttProtocol>()?;
        Some(format!("tcp://{}:{}", mqtt.broker_hostname, mqtt.port))
    }
}

pub struct NatsProtocolDefinition {
    description: ProtocolDescription,
}

impl NatsProtocolDefinition {
    pub const ID: &'static str = "org.sluice.protocol.nats";

    pub fn new() -> sluice_model::Result<Self> {
        Ok(Self {
            description: ProtocolDescriptionBuilder::create(
                Self::ID,
                "NATS",
                "Consumes events from a NATS subject",
            )
            .required_text(Label::new("servers", "Servers", "Comma-separated server URLs"))
            .required_text(Label::new("subject", "Subject", "Subject to subscribe to"))
            .build()?,
        })
    }
}

impl ProtocolDefinition for NatsProtocolDefinition {
    fn describe(&self) -> &ProtocolDescription {
        &self.description
    }

    fn endpoint(&self, protocol: &dyn TransportProtocol) -> Option<String> {
        let nats = protocol.as_any().downcast_ref::<NatsProtocol>()?;
        Some(nats.server_urls.join(","))
    }
}

/// JSON objects, one event per payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDataFormat;

impl JsonDataFormat {
    pub const ID: &'static str = "org.sluice.dataformat.json";
}

impl DataFormatDefinition for JsonDataFormat {
    fn id(&self) -> &str {
        Self::ID
    }

    fn decode(&self, payload: &[u8]) -> ElementResult<Event> {
        Event::from_slice(payload).map_err(|e| ElementError::MalformedEvent(e.to_string()))
    }

    fn encode(&self, event: &Event) -> ElementResult<Vec<u8>> {
        serde_json::to_vec(event).map_err(|e| ElementError::MalformedEvent(e.to_string()))
    }
}

/// Collects definitions during bootstrap.
#[derive(Default)]
pub struct ProtocolResolverBuilder {
    protocols: HashMap<TypeId, Arc<dyn ProtocolDefinition>>,
    data_format: Option<Arc<dyn DataFormatDefinition>>,
}

impl ProtocolResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the definition handling protocol type `P`. A later
    /// registration for the same type replaces the earlier one.
    pub fn register_protocol<P: TransportProtocol>(
        mut self,
        definition: Arc<dyn ProtocolDefinition>,
    ) -> Self {
        let id = definition.id().to_string();
        if let Some(previous) = self.protocols.insert(TypeId::of::<P>(), definition) {
            warn!(replaced = %previous.id(), protocol_id = %id, "Protocol definition replaced");
        }
        self
    }

    pub fn register_data_format(mut self, definition: Arc<dyn DataFormatDefinition>) -> Self {
        if let Some(previous) = &self.data_format {
            warn!(replaced = %previous.id(), format_id = %definition.id(), "Data format replaced");
        }
        self.data_format = Some(definition);
        self
    }

    pub fn build(self) -> ProtocolResolver {
        debug!(
            protocols = self.protocols.len(),
            data_format = ?self.data_format.as_ref().map(|f| f.id()),
            "Protocol resolver built"
        );
        ProtocolResolver {
            protocols: self.protocols,
            data_format: self.data_format,
        }
    }
}

/// Immutable protocol and data format tables.
pub struct ProtocolResolver {
    protocols: HashMap<TypeId, Arc<dyn ProtocolDefinition>>,
    data_format: Option<Arc<dyn DataFormatDefinition>>,
}

impl ProtocolResolver {
    pub fn builder() -> ProtocolResolverBuilder {
        ProtocolResolverBuilder::new()
    }

    /// Kafka, MQTT and NATS with the JSON data format.
    pub fn with_defaults() -> sluice_model::Result<Self> {
        Ok(Self::builder()
            .register_protocol::<KafkaProtocol>(Arc::new(KafkaProtocolDefinition::new()?))
            .register_protocol::<MqttProtocol>(Arc::new(MqttProtocolDefinition::new()?))
            .register_protocol::<NatsProtocol>(Arc::new(NatsProtocolDefinition::new()?))
            .register_data_format(Arc::new(JsonDataFormat))
            .build())
    }

    /// Definition registered for the runtime type of `protocol`.
    pub fn find_protocol_definition(
        &self,
        protocol: &dyn TransportProtocol,
    ) -> Option<Arc<dyn ProtocolDefinition>> {
        self.protocols.get(&protocol.as_any().type_id()).cloned()
    }

    pub fn data_format_definition(&self) -> ElementResult<Arc<dyn DataFormatDefinition>> {
        self.data_format.clone().ok_or(ElementError::MissingDataFormat)
    }

    /// Descriptions of every registered protocol, ordered by id.
    pub fn descriptions(&self) -> Vec<ProtocolDescription> {
        let mut descriptions: Vec<_> = self
            .protocols
            .values()
            .map(|d| d.describe().clone())
            .collect();
        descriptions.sort_by(|a, b| a.id().cmp(b.id()));
        descriptions
    }

    /// Pairs `protocol` with its definition and the data format.
    ///
    /// Fails if no data format is registered; `Ok(None)` if the protocol
    /// type is unknown.
    pub fn bind(&self, protocol: Arc<dyn TransportProtocol>) -> ElementResult<Option<StreamBinding>> {
        let format = self.data_format_definition()?;
        let Some(definition) = self.find_protocol_definition(protocol.as_ref()) else {
            debug!(?protocol, "No protocol definition registered");
            return Ok(None);
        };
        Ok(Some(StreamBinding {
            protocol,
            definition,
            format,
        }))
    }
}

/// A protocol instance with the definitions needed to read from it.
#[derive(Clone)]
pub struct StreamBinding {
    protocol: Arc<dyn TransportProtocol>,
    definition: Arc<dyn ProtocolDefinition>,
    format: Arc<dyn DataFormatDefinition>,
}

impl StreamBinding {
    pub fn protocol(&self) -> &dyn TransportProtocol {
        self.protocol.as_ref()
    }

    pub fn endpoint(&self) -> Option<String> {
        self.definition.endpoint(self.protocol.as_ref())
    }

    pub fn decode(&self, payload: &[u8]) -> ElementResult<Event> {
        self.format.decode(payload)
    }

    pub fn encode(&self, event: &Event) -> ElementResult<Vec<u8>> {
        self.format.encode(event)
    }
}

impl fmt::Debug for StreamBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBinding")
            .field("protocol", &self.protocol)
            .field("definition", &self.definition.id())
            .field("format", &self.format.id())
            .finish()
    }
}
