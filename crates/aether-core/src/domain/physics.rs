use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vibe::Mood;

/// Shader inputs derived from the emotional tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderParams {
    /// Hex colour, e.g. `#ff0000`.
    pub color_base: String,
    pub intensity: f64,
    pub pattern: String,
}

/// Render/physics parameters produced by the Alchemist.
///
/// Built once per clean observation and never mutated afterwards; consumers
/// receive clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    pub intent_vector: Vec<f64>,
    pub vibe_score: f64,
    pub emotional_tone: Mood,
    pub shader_params: ShaderParams,
    pub ritual_tag: String,
    pub timestamp: DateTime<Utc>,
}

impl PhysicsParams {
    /// True when everything except `timestamp` matches.
    pub fn same_shape(&self, other: &PhysicsParams) -> bool {
        self.intent_vector == other.intent_vector
            && self.vibe_score == other.vibe_score
            && self.emotional_tone == other.emotional_tone
            && self.shader_params == other.shader_params
            && self.ritual_tag == other.ritual_tag
    }
}
