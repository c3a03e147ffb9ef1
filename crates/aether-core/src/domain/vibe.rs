//! Mood and vibe shapes carried by intents.

use serde::{Deserialize, Serialize};

/// Emotional tone of an observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    Idle,
    Focused,
    Warning,
    Waking,
    Calm,
    #[default]
    Neutral,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Idle => "IDLE",
            Mood::Focused => "FOCUSED",
            Mood::Warning => "WARNING",
            Mood::Waking => "WAKING",
            Mood::Calm => "CALM",
            Mood::Neutral => "NEUTRAL",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDLE" => Ok(Mood::Idle),
            "FOCUSED" => Ok(Mood::Focused),
            "WARNING" => Ok(Mood::Warning),
            "WAKING" => Ok(Mood::Waking),
            "CALM" => Ok(Mood::Calm),
            "NEUTRAL" => Ok(Mood::Neutral),
            other => Err(format!("unknown mood: {other}")),
        }
    }
}

/// Render-facing vibe of an intent.
///
/// `energy_level` must lie in `[0.0, 1.0]`; the gate rejects values
/// outside that range rather than clamping them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VibeState {
    pub mood: Mood,
    pub energy_level: f64,
    pub urgency: f64,
}

impl VibeState {
    pub fn energy_in_bounds(&self) -> bool {
        energy_in_bounds(self.energy_level)
    }
}

/// Whether an energy level lies in the closed unit interval.
pub fn energy_in_bounds(energy_level: f64) -> bool {
    (0.0..=1.0).contains(&energy_level)
}

/// Observed vibe: sentiment score, tone, and derived intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SatiVibe {
    pub score: f64,
    pub tone: Mood,
    pub intensity: f64,
}
