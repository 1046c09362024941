use serde_json::json;
use sluice_model::{Event, FieldSelector, SourceType};
use sluice_runtime::{
    DataFormatDefinition, ElementError, JsonDataFormat, KafkaProtocol, KafkaProtocolDefinition,
    MqttProtocol, MqttProtocolDefinition, NatsProtocol, ProtocolDefinition, ProtocolResolver,
    TransportProtocol,
};
use std::any::Any;
use std::sync::Arc;

fn kafka() -> KafkaProtocol {
    KafkaProtocol {
        broker_hostname: "broker".into(),
        port: 9094,
        topic: "orders".into(),
    }
}

/// A protocol type nobody registered a definition for.
#[derive(Debug)]
struct Carrier;

impl TransportProtocol for Carrier {
    fn topic(&self) -> &str {
        "pigeons"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ── Lookup ──────────────────────────────────────────────────────

#[test]
fn finds_definition_by_runtime_type() {
    let resolver = ProtocolResolver::with_defaults().unwrap();

    let definition = resolver.find_protocol_definition(&kafka()).unwrap();
    assert_eq!(definition.id(), KafkaProtocolDefinition::ID);
    assert_eq!(definition.endpoint(&kafka()).as_deref(), Some("broker:9094"));

    let mqtt = MqttProtocol {
        broker_hostname: "mqtt".into(),
        port: 1883,
        topic: "t".into(),
    };
    let definition = resolver.find_protocol_definition(&mqtt).unwrap();
    assert_eq!(definition.id(), MqttProtocolDefinition::ID);
    assert_eq!(definition.endpoint(&mqtt).as_deref(), Some("tcp://mqtt:1883"));
}

#[test]
fn dispatches_through_trait_objects() {
    let resolver = ProtocolResolver::with_defaults().unwrap();
    let nats: Box<dyn TransportProtocol> = Box::new(NatsProtocol {
        server_urls: vec!["nats://a:4222".into(), "nats://b:4222".into()],
        subject: "events".into(),
    });
    let definition = resolver.find_protocol_definition(nats.as_ref()).unwrap();
    assert_eq!(
        definition.endpoint(nats.as_ref()).as_deref(),
        Some("nats://a:4222,nats://b:4222")
    );
}

#[test]
fn unregistered_protocol_is_absent() {
    let resolver = ProtocolResolver::with_defaults().unwrap();
    assert!(resolver.find_protocol_definition(&Carrier).is_none());

    let empty = ProtocolResolver::builder().build();
    assert!(empty.find_protocol_definition(&kafka()).is_none());
}

#[test]
fn endpoint_of_foreign_protocol_is_none() {
    let definition = KafkaProtocolDefinition::new().unwrap();
    assert!(definition.endpoint(&Carrier).is_none());
}

#[test]
fn later_registration_replaces_earlier() {
    let resolver = ProtocolResolver::builder()
        .register_protocol::<KafkaProtocol>(Arc::new(MqttProtocolDefinition::new().unwrap()))
        .register_protocol::<KafkaProtocol>(Arc::new(KafkaProtocolDefinition::new().unwrap()))
        .build();
    let definition = resolver.find_protocol_definition(&kafka()).unwrap();
    assert_eq!(definition.id(), KafkaProtocolDefinition::ID);
    assert_eq!(resolver.descriptions().len(), 1);
}

#[test]
fn descriptions_are_sorted_and_complete() {
    let resolver = ProtocolResolver::with_defaults().unwrap();
    let descriptions = resolver.descriptions();
    let ids: Vec<&str> = descriptions.iter().map(|d| d.id()).collect();
    assert_eq!(
        ids,
        vec![
            "org.sluice.protocol.kafka",
            "org.sluice.protocol.mqtt",
            "org.sluice.protocol.nats",
        ]
    );
    let kafka = &descriptions[0];
    assert_eq!(kafka.source_type(), SourceType::Stream);
    let options: Vec<&str> = kafka.config().iter().map(|p| p.id()).collect();
    assert_eq!(options, vec!["host", "port", "topic"]);
}

// ── Data format ─────────────────────────────────────────────────

#[test]
fn missing_data_format_is_configuration_error() {
    let resolver = ProtocolResolver::builder().build();
    let err = resolver.data_format_definition().err().unwrap();
    assert!(matches!(err, ElementError::MissingDataFormat));
    assert!(err.is_configuration());
}

#[test]
fn json_format_decodes_and_encodes() {
    let format = JsonDataFormat;
    let event = format
        .decode(br#"{"meta":{"score":0.75},"id":"x"}"#)
        .unwrap();
    let selector = FieldSelector::parse("s0::meta::score").unwrap();
    assert_eq!(event.get_number(&selector), Some(0.75));

    let bytes = format.encode(&event).unwrap();
    let back: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back, json!({"meta": {"score": 0.75}, "id": "x"}));
}

#[test]
fn json_format_rejects_non_objects() {
    let format = JsonDataFormat;
    let payloads: [&[u8]; 3] = [b"[1,2]", b"42", b"{not json"];
    for payload in payloads {
        let err = format.decode(payload).unwrap_err();
        assert!(matches!(err, ElementError::MalformedEvent(_)), "{payload:?}");
    }
}

// ── Binding ─────────────────────────────────────────────────────

#[test]
fn bind_combines_protocol_and_format() {
    let resolver = ProtocolResolver::with_defaults().unwrap();
    let binding = resolver.bind(Arc::new(kafka())).unwrap().unwrap();

    assert_eq!(binding.endpoint().as_deref(), Some("broker:9094"));
    assert_eq!(binding.protocol().topic(), "orders");
    let event = binding.decode(br#"{"a":1}"#).unwrap();
    assert_eq!(event, Event::new().with_field("a", 1));
    assert!(format!("{binding:?}").contains(KafkaProtocolDefinition::ID));
}

#[test]
fn bind_unknown_protocol_is_none() {
    let resolver = ProtocolResolver::with_defaults().unwrap();
    assert!(resolver.bind(Arc::new(Carrier)).unwrap().is_none());
}

#[test]
fn bind_without_format_fails() {
    let resolver = ProtocolResolver::builder()
        .register_protocol::<KafkaProtocol>(Arc::new(KafkaProtocolDefinition::new().unwrap()))
        .build();
    assert!(matches!(
        resolver.bind(Arc::new(kafka())),
        Err(ElementError::MissingDataFormat)
    ));
}
