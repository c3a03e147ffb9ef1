//! Inbound control messages from the transport.
//!
//! `input/voice_data` runs the utterance through the gate and, when clean,
//! parks it as the pending intent and asks the user to confirm.
//! `input/confirm_intent` commits the pending intent and publishes a render
//! manifest. Anything else is ignored.

use std::sync::{Arc, Mutex};

use aether_state::GemId;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::bus::PublishResult;
use crate::domain::{
    IntentKind, Mood, Payload, PhysicsParams, Result, VerifyRequest, VibeState,
};
use crate::memory::commit_change;
use crate::pipeline::{IntentPipeline, PipelineOutcome};
use crate::sati;

pub const VOICE_DATA_METHOD: &str = "input/voice_data";
pub const CONFIRM_INTENT_METHOD: &str = "input/confirm_intent";
pub const VERIFY_TOPIC: &str = "intent_verify";
pub const MANIFEST_TOPIC: &str = "intent_manifest";
pub const CONFIRMED_RITUAL_TAG: &str = "confirmed";

const VERIFY_VIBE: VibeState = VibeState {
    mood: Mood::Warning,
    energy_level: 0.8,
    urgency: 0.5,
};

/// A parsed inbound control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    VoiceData { text: String },
    ConfirmIntent,
    Ignored { method: String },
}

#[derive(Deserialize)]
struct RawControl {
    #[serde(default)]
    method: String,
    #[serde(default)]
    params: Value,
}

impl ControlMessage {
    /// Parse one wire message. Only malformed JSON is an error; unknown
    /// methods parse as [`ControlMessage::Ignored`].
    pub fn parse(line: &str) -> std::result::Result<Self, serde_json::Error> {
        let raw: RawControl = serde_json::from_str(line)?;
        Ok(match raw.method.as_str() {
            VOICE_DATA_METHOD => ControlMessage::VoiceData {
                text: raw
                    .params
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            CONFIRM_INTENT_METHOD => ControlMessage::ConfirmIntent,
            _ => ControlMessage::Ignored { method: raw.method },
        })
    }
}

/// Result of handling one control message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorOutcome {
    /// Voice input passed the gate; a verify request went out.
    VerifyRequested { publish: PublishResult },
    /// A pending intent was committed and manifested.
    Manifested {
        gem_id: GemId,
        publish: PublishResult,
    },
    /// Voice input was refused by the gate.
    Rejected(PipelineOutcome),
    /// Confirmation arrived with nothing pending.
    NothingPending,
    Ignored,
}

#[derive(Debug, Clone)]
struct PendingIntent {
    text: String,
    params: PhysicsParams,
}

/// Turns control messages into gate runs, commits, and publishes.
#[derive(Debug)]
pub struct IntentProcessor {
    pipeline: Arc<IntentPipeline>,
    pending: Mutex<Option<PendingIntent>>,
}

impl IntentProcessor {
    pub fn new(pipeline: Arc<IntentPipeline>) -> Self {
        Self {
            pipeline,
            pending: Mutex::new(None),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Parse and handle one wire line.
    pub async fn handle_line(&self, line: &str) -> Result<ProcessorOutcome> {
        let message = ControlMessage::parse(line)?;
        self.handle(message).await
    }

    pub async fn handle(&self, message: ControlMessage) -> Result<ProcessorOutcome> {
        match message {
            ControlMessage::VoiceData { text } => self.voice_data(&text).await,
            ControlMessage::ConfirmIntent => self.confirm_intent().await,
            ControlMessage::Ignored { method } => {
                debug!(method = %method, "ignoring control message");
                Ok(ProcessorOutcome::Ignored)
            }
        }
    }

    async fn voice_data(&self, text: &str) -> Result<ProcessorOutcome> {
        let observation = sati::observe_text(text, 0.0, Mood::Neutral);
        let params = match self.pipeline.evaluate(&observation) {
            Ok(params) => params,
            Err(e) => return Ok(ProcessorOutcome::Rejected(self.pipeline.reject(e).await)),
        };

        self.set_pending(PendingIntent {
            text: text.to_string(),
            params,
        });

        let request = VerifyRequest {
            kind: Some(IntentKind::Verify),
            text: text.to_string(),
            vibe_state: VERIFY_VIBE,
        };
        let publish = self
            .pipeline
            .bus()
            .publish(
                VERIFY_TOPIC,
                &Payload::Verify(request),
                &self.pipeline.stamper().header(),
            )
            .await;
        info!("intent awaiting confirmation");
        Ok(ProcessorOutcome::VerifyRequested { publish })
    }

    async fn confirm_intent(&self) -> Result<ProcessorOutcome> {
        let Some(pending) = self.take_pending() else {
            info!("confirmation received with no pending intent");
            return Ok(ProcessorOutcome::NothingPending);
        };

        let committed = commit_change(
            self.pipeline.vault(),
            &pending.params,
            &pending.text,
            CONFIRMED_RITUAL_TAG,
        )
        .await;
        let gem_id = match committed {
            Ok(id) => id,
            Err(e) => {
                // Keep the intent so the user can confirm again.
                self.set_pending(pending);
                return Err(e.into());
            }
        };

        let manifest = self.pipeline.alchemist().manifest(&pending.params);
        let publish = self
            .pipeline
            .bus()
            .publish(
                MANIFEST_TOPIC,
                &Payload::Render(manifest),
                &self.pipeline.stamper().header(),
            )
            .await;
        Ok(ProcessorOutcome::Manifested { gem_id, publish })
    }

    fn set_pending(&self, intent: PendingIntent) {
        *self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(intent);
    }

    fn take_pending(&self) -> Option<PendingIntent> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_methods() {
        let voice = r#"{"method":"input/voice_data","params":{"text":"hi"}}"#;
        assert_eq!(
            ControlMessage::parse(voice).unwrap(),
            ControlMessage::VoiceData { text: "hi".into() }
        );
        assert_eq!(
            ControlMessage::parse(r#"{"method":"input/confirm_intent"}"#).unwrap(),
            ControlMessage::ConfirmIntent
        );
    }

    #[test]
    fn unknown_method_is_ignored() {
        assert_eq!(
            ControlMessage::parse(r#"{"method":"input/touch","params":{}}"#).unwrap(),
            ControlMessage::Ignored {
                method: "input/touch".into()
            }
        );
        assert_eq!(
            ControlMessage::parse("{}").unwrap(),
            ControlMessage::Ignored { method: String::new() }
        );
    }

    #[test]
    fn voice_data_without_text_is_empty() {
        assert_eq!(
            ControlMessage::parse(r#"{"method":"input/voice_data"}"#).unwrap(),
            ControlMessage::VoiceData { text: String::new() }
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ControlMessage::parse("not json").is_err());
    }
}
