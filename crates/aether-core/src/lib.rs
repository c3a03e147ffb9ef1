//! Aether Core Library
//!
//! Intent events flow observe → validate → transform → commit → publish:
//! the [`gate`] inspects and transmutes observations, the [`memory`] vault
//! stores them as gems, and the [`bus`] fans stamped envelopes out to
//! subscribers. The retention ritual sweeps stale gems independently.

pub mod audit;
pub mod bus;
pub mod config;
pub mod domain;
pub mod gate;
pub mod memory;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod processor;
pub mod producer;
pub mod sati;
pub mod telemetry;

pub use audit::{AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use bus::{
    DeadLetterEntry, DeadLetterQueue, DeliveryFailure, EnvelopeBus, FnSubscriber, PublishReport,
    PublishResult, Subscriber, SubscriptionId,
};
pub use config::AetherConfig;
pub use domain::{
    CoreError, DeliveryError, Envelope, FallbackResponse, IdentityHeader, IdentityStamper,
    IntentKind, Mood, Observation, Payload, PhysicsParams, RenderIntent, RenderParams, Result,
    Role, SatiVibe, ShaderParams, ValidationError, VerifyRequest, VibeState, PROTOCOL_VERSION,
};
pub use gate::{
    check_envelope, validate_envelope, validate_message, Alchemist, Diplomat, Sentry, Verdict,
};
pub use memory::{
    commit_change, spawn_retention_schedule, CleanseReport, CleanseStatus, GemMetadata,
    MemoryError, RetentionPolicy, RetentionRitual, Vault,
};
pub use metrics::BusMetrics;
pub use pipeline::{IntentPipeline, PipelineOutcome, FALLBACK_TOPIC};
pub use processor::{
    ControlMessage, IntentProcessor, ProcessorOutcome, MANIFEST_TOPIC, VERIFY_TOPIC,
};
pub use producer::{
    spawn_gate_worker, spawn_producer, GateWorkerStats, IterProducer, ObservationProducer,
};
pub use telemetry::init_tracing;

pub use aether_state::{Gem, GemFilter, GemId, GemStore, MemoryGemStore, SurrealGemStore};
