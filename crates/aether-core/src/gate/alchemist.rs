use chrono::Utc;
use tracing::info;

use crate::domain::{
    IntentKind, Mood, PhysicsParams, RenderIntent, RenderParams, SatiVibe, ShaderParams, VibeState,
};

/// Ritual tag stamped on freshly transmuted params.
pub const DEFAULT_RITUAL_TAG: &str = "normal";

const MANIFEST_GEOMETRY: &str = "FLUID_ORB";
const MANIFEST_PULSE_FREQUENCY: f64 = 1.0;
const MANIFEST_BLOOM_FACTOR: f64 = 0.8;
const MANIFEST_URGENCY: f64 = 0.1;

/// Fixed tone to `(colour, pattern)` table.
pub fn palette(tone: Mood) -> (&'static str, &'static str) {
    match tone {
        Mood::Focused => ("#ffffff", "sharp_beams"),
        Mood::Warning => ("#ff0000", "chaotic_noise"),
        Mood::Waking => ("#00ffff", "expanding_rings"),
        _ => ("#2323ee", "calm_waves"),
    }
}

fn secondary_chroma(tone: Mood) -> &'static str {
    match tone {
        Mood::Calm => "#0000ff",
        _ => "#ff00ff",
    }
}

/// Second gate stage: deterministic vibe to physics mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alchemist;

impl Alchemist {
    pub fn new() -> Self {
        Self
    }

    /// Pure apart from `timestamp`.
    pub fn transmute(&self, vibe: &SatiVibe, intent_vector: &[f64]) -> PhysicsParams {
        let (color_base, pattern) = palette(vibe.tone);
        info!(tone = %vibe.tone, color = color_base, "transmuted vibe");
        PhysicsParams {
            intent_vector: intent_vector.to_vec(),
            vibe_score: vibe.score,
            emotional_tone: vibe.tone,
            shader_params: ShaderParams {
                color_base: color_base.to_string(),
                intensity: vibe.intensity,
                pattern: pattern.to_string(),
            },
            ritual_tag: DEFAULT_RITUAL_TAG.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Render manifest for a confirmed intent. Intensity is carried into
    /// `energy_level` unchanged; out-of-range values are left for the
    /// envelope validator to refuse.
    pub fn manifest(&self, params: &PhysicsParams) -> RenderIntent {
        RenderIntent {
            kind: Some(IntentKind::Manifest),
            vibe_state: VibeState {
                mood: params.emotional_tone,
                energy_level: params.shader_params.intensity,
                urgency: MANIFEST_URGENCY,
            },
            render_params: RenderParams {
                geometry: MANIFEST_GEOMETRY.to_string(),
                chroma_primary: params.shader_params.color_base.clone(),
                chroma_secondary: secondary_chroma(params.emotional_tone).to_string(),
                pulse_frequency: MANIFEST_PULSE_FREQUENCY,
                bloom_factor: MANIFEST_BLOOM_FACTOR,
            },
        }
    }
}
