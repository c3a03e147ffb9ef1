//! observe → validate → transform → commit → publish, end to end.

use std::sync::{Arc, Mutex};

use aether_core::{
    spawn_gate_worker, spawn_producer, validate_message, ControlMessage, EnvelopeBus,
    GateWorkerStats, IdentityStamper, IntentKind, IntentPipeline, IntentProcessor, IterProducer,
    MemoryAuditSink, MemoryGemStore, Mood, Observation, PipelineOutcome, ProcessorOutcome, Role,
    SatiVibe, Vault, FALLBACK_TOPIC, MANIFEST_TOPIC, VERIFY_TOPIC,
};
use serde_json::Value;
use tokio::sync::mpsc;

struct Harness {
    pipeline: Arc<IntentPipeline>,
    inbox: Arc<Mutex<Vec<Value>>>,
}

impl Harness {
    fn new() -> Self {
        let bus = Arc::new(EnvelopeBus::new(MemoryAuditSink::new()));
        let inbox = Arc::new(Mutex::new(Vec::new()));
        let sink = inbox.clone();
        bus.subscribe_fn("ui", move |message| {
            let sink = sink.clone();
            async move {
                assert!(validate_message(&message).passed, "invalid envelope: {message}");
                sink.lock().unwrap().push(serde_json::from_str(&message).unwrap());
                Ok(())
            }
        });
        let pipeline = Arc::new(IntentPipeline::new(
            Vault::new(Arc::new(MemoryGemStore::new())),
            bus,
            Arc::new(IdentityStamper::new(Role::IntentCore)),
        ));
        Self { pipeline, inbox }
    }

    fn topics(&self) -> Vec<String> {
        self.inbox
            .lock()
            .unwrap()
            .iter()
            .map(|e| e["params"]["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn last(&self) -> Value {
        self.inbox.lock().unwrap().last().cloned().expect("no envelope")
    }
}

fn clean(text: &str, tone: Mood) -> Observation {
    Observation::new(
        vec![0.2, 0.4],
        SatiVibe {
            score: 0.6,
            tone,
            intensity: 0.6,
        },
    )
    .with_text(text)
}

#[tokio::test]
async fn clean_observation_is_committed_then_published() {
    let h = Harness::new();
    let outcome = h
        .pipeline
        .process(&clean("wake the room", Mood::Waking), "render_light")
        .await
        .unwrap();

    let PipelineOutcome::Committed { gem_id, params, publish } = outcome else {
        panic!("expected commit");
    };
    assert_eq!(publish.report().unwrap().succeeded, 1);

    let gem = h.pipeline.vault().get(&gem_id).await.unwrap().unwrap();
    assert_eq!(gem.text, "wake the room");
    assert_eq!(gem.ritual_tag, "normal");
    assert_eq!(gem.emotional_tone, "WAKING");

    let envelope = h.last();
    assert_eq!(envelope["method"], "tools/render_light");
    let arguments = &envelope["params"]["arguments"];
    assert_eq!(arguments["shader_params"]["color_base"], "#00ffff");
    assert_eq!(arguments["shader_params"]["pattern"], "expanding_rings");
    assert_eq!(arguments["vibe_score"], params.vibe_score);
    assert_eq!(envelope["params"]["_identity"]["role"], "INTENT_CORE");
}

#[tokio::test]
async fn rejected_observation_publishes_fallback_only() {
    let h = Harness::new();
    let outcome = h
        .pipeline
        .process(&Observation::default(), "render_light")
        .await
        .unwrap();

    assert_eq!(outcome.label(), "negotiated");
    assert_eq!(h.topics(), vec![FALLBACK_TOPIC]);
    assert_eq!(h.last()["params"]["arguments"]["fallback_shader"], "static_noise");
    assert!(h.pipeline.vault().list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn voice_then_confirm_manifests_intent() {
    let h = Harness::new();
    let processor = IntentProcessor::new(h.pipeline.clone());

    let outcome = processor
        .handle_line(r#"{"method":"input/voice_data","params":{"text":"DELETE SECTOR 7?"}}"#)
        .await
        .unwrap();
    assert!(matches!(outcome, ProcessorOutcome::VerifyRequested { .. }));
    assert!(processor.has_pending());
    assert!(h.pipeline.vault().list_all().await.unwrap().is_empty());

    let verify = h.last();
    assert_eq!(verify["params"]["name"], VERIFY_TOPIC);
    assert_eq!(verify["params"]["arguments"]["type"], "VERIFY");
    assert_eq!(verify["params"]["arguments"]["text"], "DELETE SECTOR 7?");
    assert_eq!(verify["params"]["arguments"]["vibe_state"]["mood"], "WARNING");
    assert_eq!(verify["params"]["arguments"]["vibe_state"]["energy_level"], 0.8);

    let outcome = processor.handle(ControlMessage::ConfirmIntent).await.unwrap();
    let ProcessorOutcome::Manifested { gem_id, .. } = outcome else {
        panic!("expected manifest");
    };
    assert!(!processor.has_pending());

    let gem = h.pipeline.vault().get(&gem_id).await.unwrap().unwrap();
    assert_eq!(gem.text, "DELETE SECTOR 7?");
    assert_eq!(gem.ritual_tag, "confirmed");

    let manifest = h.last();
    assert_eq!(manifest["params"]["name"], MANIFEST_TOPIC);
    let arguments = &manifest["params"]["arguments"];
    assert_eq!(
        serde_json::from_value::<IntentKind>(arguments["type"].clone()).unwrap(),
        IntentKind::Manifest
    );
    assert_eq!(arguments["render_params"]["geometry"], "FLUID_ORB");
    assert_eq!(h.topics(), vec![VERIFY_TOPIC, MANIFEST_TOPIC]);
}

#[tokio::test]
async fn confirm_without_pending_is_a_noop() {
    let h = Harness::new();
    let processor = IntentProcessor::new(h.pipeline.clone());
    let outcome = processor.handle(ControlMessage::ConfirmIntent).await.unwrap();
    assert_eq!(outcome, ProcessorOutcome::NothingPending);
    assert!(h.topics().is_empty());
}

#[tokio::test]
async fn empty_voice_input_is_negotiated() {
    let h = Harness::new();
    let processor = IntentProcessor::new(h.pipeline.clone());
    let outcome = processor
        .handle(ControlMessage::VoiceData { text: String::new() })
        .await
        .unwrap();
    match outcome {
        ProcessorOutcome::Rejected(PipelineOutcome::Negotiated { reason, .. }) => {
            assert_eq!(reason, "MISSING_VECTOR")
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!processor.has_pending());
    assert_eq!(h.topics(), vec![FALLBACK_TOPIC]);
}

#[tokio::test]
async fn unknown_methods_are_ignored() {
    let h = Harness::new();
    let processor = IntentProcessor::new(h.pipeline.clone());
    let outcome = processor
        .handle_line(r#"{"method":"input/heartbeat"}"#)
        .await
        .unwrap();
    assert_eq!(outcome, ProcessorOutcome::Ignored);
    assert!(h.topics().is_empty());
    assert!(processor.handle_line("{broken").await.is_err());
}

#[tokio::test]
async fn producer_feeds_gate_worker() {
    let h = Harness::new();
    let (tx, rx) = mpsc::channel(2);
    let worker = spawn_gate_worker(h.pipeline.clone(), "render_light".to_string(), rx);

    let parajika = Observation::new(
        vec![0.1],
        SatiVibe {
            score: -0.97,
            tone: Mood::Warning,
            intensity: 0.97,
        },
    );
    let items = vec![
        clean("one", Mood::Focused),
        Observation::default(),
        parajika,
        clean("two", Mood::Calm),
    ];
    let forwarded = spawn_producer(IterProducer::new("replay", items), tx)
        .await
        .unwrap();
    assert_eq!(forwarded, 4);

    let stats = worker.await.unwrap();
    assert_eq!(
        stats,
        GateWorkerStats {
            received: 4,
            committed: 2,
            negotiated: 1,
            halted: 1,
            errors: 0,
        }
    );
    assert_eq!(
        h.topics(),
        vec!["render_light", FALLBACK_TOPIC, "render_light"]
    );
    assert_eq!(h.pipeline.vault().list_all().await.unwrap().len(), 2);
}
