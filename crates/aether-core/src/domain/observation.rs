use serde::{Deserialize, Serialize};

use super::vibe::{SatiVibe, VibeState};

/// Raw input to the intent gate.
///
/// Producers emit these; the Sentry decides whether they may proceed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub intent_vector: Vec<f64>,
    #[serde(default)]
    pub vibe: SatiVibe,
    /// Render-facing vibe, when the producer supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibe_state: Option<VibeState>,
    /// Source utterance, if the observation came from voice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Observation {
    pub fn new(intent_vector: Vec<f64>, vibe: SatiVibe) -> Self {
        Self {
            intent_vector,
            vibe,
            vibe_state: None,
            text: None,
        }
    }

    pub fn with_vibe_state(mut self, vibe_state: VibeState) -> Self {
        self.vibe_state = Some(vibe_state);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Text to persist when this observation is committed.
    pub fn text_or_default(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}
