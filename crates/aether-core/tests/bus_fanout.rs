//! Fan-out contract of the envelope bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aether_core::{
    DeliveryError, Envelope, EnvelopeBus, IdentityStamper, MemoryAuditSink, Payload,
    PublishResult, Role, SubscriptionId,
};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

type Inbox = Arc<Mutex<Vec<String>>>;

fn collector(bus: &EnvelopeBus, name: &'static str) -> (SubscriptionId, Inbox) {
    let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
    let sink = inbox.clone();
    let id = bus.subscribe_fn(name, move |message| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(message);
            Ok(())
        }
    });
    (id, inbox)
}

fn failing(bus: &EnvelopeBus, calls: Arc<Mutex<usize>>) -> SubscriptionId {
    bus.subscribe_fn("broken-socket", move |_message| {
        let calls = calls.clone();
        async move {
            *calls.lock().unwrap() += 1;
            Err(DeliveryError::Transport("socket closed".into()))
        }
    })
}

#[derive(Debug)]
struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("cursor handles cannot be encoded"))
    }
}

#[tokio::test]
async fn every_subscriber_gets_payload_and_identity() {
    let bus = EnvelopeBus::new(MemoryAuditSink::new());
    let inboxes: Vec<Inbox> = ["ui", "recorder", "relay"]
        .into_iter()
        .map(|name| collector(&bus, name).1)
        .collect();

    let identity = IdentityStamper::new(Role::BioDriver).header();
    let payload = json!({"intent_vector": "LIGHT", "vibe_score": 0.4});
    let result = bus.publish("ui:shader_intent", &payload, &identity).await;

    let report = result.report().expect("delivered");
    assert_eq!(report.topic, "ui:shader_intent");
    assert_eq!((report.attempted, report.succeeded, report.failed), (3, 3, 0));

    for inbox in inboxes {
        let messages = inbox.lock().unwrap();
        assert_eq!(messages.len(), 1);
        let envelope: Value = serde_json::from_str(&messages[0]).unwrap();
        assert_eq!(envelope["protocol_version"], "2.0");
        assert_eq!(envelope["method"], "tools/ui:shader_intent");
        assert_eq!(envelope["params"]["name"], "ui:shader_intent");
        assert_eq!(envelope["params"]["arguments"], payload);
        assert_eq!(
            envelope["params"]["_identity"],
            serde_json::to_value(&identity).unwrap()
        );
    }
}

#[tokio::test]
async fn typed_payload_survives_the_wire() {
    let bus = EnvelopeBus::new(MemoryAuditSink::new());
    let (_, inbox) = collector(&bus, "ui");
    let identity = IdentityStamper::new(Role::IntentCore).header();
    let payload = Payload::Opaque(json!({"heart_rate": 64, "energy_level": 0.2}));

    bus.publish("bio_vitals", &payload, &identity).await;

    let messages = inbox.lock().unwrap();
    let envelope: Envelope<Payload> = serde_json::from_str(&messages[0]).unwrap();
    assert_eq!(envelope.params.arguments, payload);
    assert_eq!(envelope.params.identity, identity);
}

#[tokio::test]
async fn failing_subscriber_does_not_block_others() {
    let bus = EnvelopeBus::new(MemoryAuditSink::new());
    let (_, before) = collector(&bus, "before");
    let calls = Arc::new(Mutex::new(0));
    failing(&bus, calls.clone());
    let (_, after) = collector(&bus, "after");

    let identity = IdentityStamper::new(Role::Gateway).header();
    let result = bus.publish("t", &json!({"n": 1}), &identity).await;

    let report = result.report().unwrap();
    assert_eq!((report.attempted, report.succeeded, report.failed), (3, 2, 1));
    assert_eq!(report.failures[0].subscriber, "broken-socket");
    assert!(report.failures[0].error.contains("socket closed"));
    assert_eq!(before.lock().unwrap().len(), 1);
    assert_eq!(after.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failing_subscriber_keeps_receiving() {
    let bus = EnvelopeBus::new(MemoryAuditSink::new());
    let calls = Arc::new(Mutex::new(0));
    let id = failing(&bus, calls.clone());
    let identity = IdentityStamper::new(Role::Gateway).header();

    for n in 0..3 {
        bus.publish("t", &json!({ "n": n }), &identity).await;
    }
    assert_eq!(*calls.lock().unwrap(), 3);
    assert_eq!(bus.subscriber_count(), 1);

    assert!(bus.unsubscribe(id));
    bus.publish("t", &json!({"n": 3}), &identity).await;
    assert_eq!(*calls.lock().unwrap(), 3);
}

#[tokio::test]
async fn unserializable_payload_is_dead_lettered() {
    let audit = MemoryAuditSink::new();
    let bus = EnvelopeBus::new(audit.clone());
    let (_, inbox) = collector(&bus, "ui");
    let identity = IdentityStamper::new(Role::Cognitive).header();

    let result = bus.publish("t", &Unserializable, &identity).await;

    match &result {
        PublishResult::DeadLettered { reason } => {
            assert!(reason.starts_with("serialization error: "), "{reason}");
            assert!(reason.contains("cursor handles cannot be encoded"));
        }
        other => panic!("expected dead letter, got {other:?}"),
    }
    assert!(inbox.lock().unwrap().is_empty());

    let letters = bus.dead_letters().entries();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].payload, "Unserializable");
    assert_eq!(bus.metrics().dead_lettered(), 1);
    assert_eq!(bus.metrics().published(), 0);
    assert_eq!(audit.by_action("DeadLetter").len(), 1);
}

#[tokio::test]
async fn non_string_map_keys_are_dead_lettered() {
    let bus = EnvelopeBus::new(MemoryAuditSink::new());
    let (_, inbox) = collector(&bus, "ui");
    let identity = IdentityStamper::new(Role::Cognitive).header();
    let mut payload = HashMap::new();
    payload.insert((1u8, 2u8), "pair");

    let result = bus.publish("t", &payload, &identity).await;

    assert!(!result.is_delivered());
    assert!(inbox.lock().unwrap().is_empty());
    assert_eq!(bus.dead_letters().len(), 1);
}

#[tokio::test]
async fn duplicate_registration_delivers_twice() {
    let bus = EnvelopeBus::new(MemoryAuditSink::new());
    let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..2 {
        let sink = inbox.clone();
        bus.subscribe_fn("dup", move |message| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(message);
                Ok(())
            }
        });
    }
    let identity = IdentityStamper::new(Role::Gateway).header();
    bus.publish("t", &1u8, &identity).await;
    assert_eq!(inbox.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn no_subscribers_still_reports() {
    let bus = EnvelopeBus::new(MemoryAuditSink::new());
    let identity = IdentityStamper::new(Role::Gateway).header();
    let result = bus.publish("quiet", &json!(null), &identity).await;
    let report = result.report().unwrap();
    assert_eq!((report.attempted, report.succeeded, report.failed), (0, 0, 0));
}
