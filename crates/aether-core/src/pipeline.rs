//! observe → validate → transform → commit → publish.

use std::sync::Arc;

use aether_state::GemId;
use tracing::info;

use crate::bus::{EnvelopeBus, PublishResult};
use crate::domain::{
    FallbackResponse, IdentityStamper, Observation, Payload, PhysicsParams, Result, ValidationError,
};
use crate::gate::{Alchemist, Diplomat, Sentry};
use crate::memory::{commit_change, Vault};
use crate::obs;

/// Topic carrying Diplomat fallbacks.
pub const FALLBACK_TOPIC: &str = "intent_fallback";

/// What happened to one observation.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Clean: transmuted, stored, and published.
    Committed {
        gem_id: GemId,
        params: PhysicsParams,
        publish: PublishResult,
    },
    /// Rejected but recoverable: a fallback was published instead.
    Negotiated {
        reason: &'static str,
        fallback: FallbackResponse,
        publish: PublishResult,
    },
    /// PARAJIKA: nothing stored, nothing published.
    Halted { reason: &'static str },
}

impl PipelineOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineOutcome::Committed { .. } => "committed",
            PipelineOutcome::Negotiated { .. } => "negotiated",
            PipelineOutcome::Halted { .. } => "halted",
        }
    }
}

/// The gate stages wired to a vault and a bus.
#[derive(Debug)]
pub struct IntentPipeline {
    sentry: Sentry,
    alchemist: Alchemist,
    diplomat: Diplomat,
    vault: Vault,
    bus: Arc<EnvelopeBus>,
    stamper: Arc<IdentityStamper>,
}

impl IntentPipeline {
    pub fn new(vault: Vault, bus: Arc<EnvelopeBus>, stamper: Arc<IdentityStamper>) -> Self {
        Self {
            sentry: Sentry::new(),
            alchemist: Alchemist::new(),
            diplomat: Diplomat::new(),
            vault,
            bus,
            stamper,
        }
    }

    pub fn with_sentry(mut self, sentry: Sentry) -> Self {
        self.sentry = sentry;
        self
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn bus(&self) -> &Arc<EnvelopeBus> {
        &self.bus
    }

    pub fn stamper(&self) -> &Arc<IdentityStamper> {
        &self.stamper
    }

    pub fn alchemist(&self) -> &Alchemist {
        &self.alchemist
    }

    /// Run Sentry then Alchemist without side effects.
    pub fn evaluate(
        &self,
        observation: &Observation,
    ) -> std::result::Result<PhysicsParams, ValidationError> {
        self.sentry.check(observation)?;
        Ok(self
            .alchemist
            .transmute(&observation.vibe, &observation.intent_vector))
    }

    /// Run the full chain and publish the result on `topic`.
    ///
    /// Only storage failures surface as errors; gate rejections come back as
    /// [`PipelineOutcome::Negotiated`] or [`PipelineOutcome::Halted`].
    pub async fn process(&self, observation: &Observation, topic: &str) -> Result<PipelineOutcome> {
        let params = match self.evaluate(observation) {
            Ok(params) => params,
            Err(e) => return Ok(self.reject(e).await),
        };

        let gem_id = commit_change(
            &self.vault,
            &params,
            observation.text_or_default(),
            &params.ritual_tag,
        )
        .await?;

        let publish = self
            .bus
            .publish(topic, &Payload::Physics(params.clone()), &self.stamper.header())
            .await;
        info!(gem_id = %gem_id, topic = %topic, "intent committed");

        Ok(PipelineOutcome::Committed {
            gem_id,
            params,
            publish,
        })
    }

    /// Turn a rejection into an outcome. PARAJIKA halts; anything else is
    /// negotiated and the fallback is published on [`FALLBACK_TOPIC`].
    pub async fn reject(&self, error: ValidationError) -> PipelineOutcome {
        let reason = error.code();
        obs::emit_gate_rejected(reason);

        if error == ValidationError::Parajika {
            return PipelineOutcome::Halted { reason };
        }

        let fallback = self.diplomat.negotiate(reason);
        let publish = self
            .bus
            .publish(
                FALLBACK_TOPIC,
                &Payload::Fallback(fallback.clone()),
                &self.stamper.header(),
            )
            .await;
        PipelineOutcome::Negotiated {
            reason,
            fallback,
            publish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::domain::{Mood, Role, SatiVibe};
    use aether_state::MemoryGemStore;

    fn pipeline() -> IntentPipeline {
        IntentPipeline::new(
            Vault::new(Arc::new(MemoryGemStore::new())),
            Arc::new(EnvelopeBus::new(MemoryAuditSink::new())),
            Arc::new(IdentityStamper::new(Role::Cognitive)),
        )
    }

    fn observation(vector: Vec<f64>, score: f64) -> Observation {
        Observation::new(
            vector,
            SatiVibe {
                score,
                tone: Mood::Focused,
                intensity: score.abs(),
            },
        )
    }

    #[test]
    fn evaluate_has_no_side_effects() {
        let p = pipeline();
        let params = p.evaluate(&observation(vec![0.3], 0.5)).unwrap();
        assert_eq!(params.shader_params.color_base, "#ffffff");
        assert_eq!(p.evaluate(&Observation::default()), Err(ValidationError::MissingVector));
    }

    #[tokio::test]
    async fn parajika_halts_without_publishing() {
        let p = pipeline();
        let outcome = p.process(&observation(vec![0.3], -0.99), "t").await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Halted { reason: "PARAJIKA" });
        assert_eq!(p.bus().metrics().published(), 0);
        assert!(p.vault().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_vector_is_negotiated() {
        let p = pipeline();
        let outcome = p.process(&Observation::default(), "t").await.unwrap();
        match outcome {
            PipelineOutcome::Negotiated { reason, fallback, publish } => {
                assert_eq!(reason, "MISSING_VECTOR");
                assert_eq!(fallback.fallback_shader, "static_noise");
                assert!(publish.is_delivered());
            }
            other => panic!("unexpected outcome {}", other.label()),
        }
        assert!(p.vault().list_all().await.unwrap().is_empty());
    }
}
