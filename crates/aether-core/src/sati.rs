//! Sati: the observation buffer in front of the gate.
//!
//! Records the vibe of incoming stimuli and encodes text into a small intent
//! vector. The encoding is a stand-in for a real embedding model.

use tracing::info;

use crate::domain::{Mood, Observation, SatiVibe};

/// Characters of input considered by [`encode_intent`].
pub const INTENT_WINDOW: usize = 10;

pub fn observe(score: f64, tone: Mood) -> SatiVibe {
    info!(tone = %tone, score = score, "observed vibe");
    SatiVibe {
        score,
        tone,
        intensity: score.abs(),
    }
}

/// First [`INTENT_WINDOW`] characters, each mapped to `(codepoint % 100) / 100`.
pub fn encode_intent(text: &str) -> Vec<f64> {
    text.chars()
        .take(INTENT_WINDOW)
        .map(|c| f64::from(u32::from(c) % 100) / 100.0)
        .collect()
}

/// Build a gate observation from a voice utterance.
pub fn observe_text(text: &str, score: f64, tone: Mood) -> Observation {
    Observation::new(encode_intent(text), observe(score, tone)).with_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_is_absolute_score() {
        let vibe = observe(-0.6, Mood::Warning);
        assert_eq!(vibe.intensity, 0.6);
        assert_eq!(vibe.tone, Mood::Warning);
    }

    #[test]
    fn encodes_first_ten_chars() {
        let vector = encode_intent("Lights on in the hall");
        assert_eq!(vector.len(), 10);
        // 'L' = 76
        assert_eq!(vector[0], 0.76);
        // 'i' = 105
        assert_eq!(vector[1], 0.05);
    }

    #[test]
    fn empty_text_gives_empty_vector() {
        assert!(encode_intent("").is_empty());
        assert!(observe_text("", 0.0, Mood::Neutral).intent_vector.is_empty());
    }
}
