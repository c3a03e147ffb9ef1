//! Typed `arguments` carried inside an envelope.
//!
//! The wire format is a plain JSON object; [`Payload`] is untagged so each
//! variant serializes exactly as its inner struct. Anything that matches no
//! known shape lands in [`Payload::Opaque`].

use serde::{Deserialize, Serialize};

use super::physics::PhysicsParams;
use super::vibe::VibeState;

/// Discriminator for intent payloads (`"type"` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    Manifest,
    Verify,
}

/// Geometry and colour hints for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    pub geometry: String,
    pub chroma_primary: String,
    pub chroma_secondary: String,
    pub pulse_frequency: f64,
    pub bloom_factor: f64,
}

/// A manifested intent: vibe plus how to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderIntent {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<IntentKind>,
    pub vibe_state: VibeState,
    pub render_params: RenderParams,
}

/// Ask the user to confirm a pending intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<IntentKind>,
    pub text: String,
    pub vibe_state: VibeState,
}

/// User-facing response when the gate refuses an observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackResponse {
    pub action: String,
    pub message: String,
    pub fallback_shader: String,
    /// Rejection code that triggered the fallback.
    pub reason: String,
}

/// Known payload shapes plus an escape hatch for anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Physics(PhysicsParams),
    Render(RenderIntent),
    Verify(VerifyRequest),
    Fallback(FallbackResponse),
    Opaque(serde_json::Value),
}

impl Payload {
    pub fn variant_name(&self) -> &'static str {
        match self {
            Payload::Physics(_) => "physics",
            Payload::Render(_) => "render",
            Payload::Verify(_) => "verify",
            Payload::Fallback(_) => "fallback",
            Payload::Opaque(_) => "opaque",
        }
    }
}

impl From<PhysicsParams> for Payload {
    fn from(params: PhysicsParams) -> Self {
        Payload::Physics(params)
    }
}

impl From<RenderIntent> for Payload {
    fn from(intent: RenderIntent) -> Self {
        Payload::Render(intent)
    }
}

impl From<VerifyRequest> for Payload {
    fn from(request: VerifyRequest) -> Self {
        Payload::Verify(request)
    }
}

impl From<FallbackResponse> for Payload {
    fn from(response: FallbackResponse) -> Self {
        Payload::Fallback(response)
    }
}
