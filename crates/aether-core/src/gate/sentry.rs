use tracing::{error, warn};

use crate::domain::{Observation, ValidationError};

use super::Verdict;

/// Vibe scores strictly below this trip the PARAJIKA guardrail.
pub const PARAJIKA_THRESHOLD: f64 = -0.9;

/// First gate stage: structural and safety inspection.
#[derive(Debug, Clone, Copy)]
pub struct Sentry {
    parajika_threshold: f64,
}

impl Default for Sentry {
    fn default() -> Self {
        Self {
            parajika_threshold: PARAJIKA_THRESHOLD,
        }
    }
}

impl Sentry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks, in order: intent vector present, PARAJIKA guardrail, a finite
    /// score, and `energy_level` bounds when a vibe state is attached. A NaN
    /// score fails the guardrail.
    pub fn check(&self, observation: &Observation) -> Result<(), ValidationError> {
        if observation.intent_vector.is_empty() {
            warn!("missing intent vector, blocking");
            return Err(ValidationError::MissingVector);
        }

        let score = observation.vibe.score;
        if score.is_nan() || score < self.parajika_threshold {
            error!(vibe_score = score, "PARAJIKA detected, hard stop");
            return Err(ValidationError::Parajika);
        }

        if !score.is_finite() {
            warn!(vibe_score = score, "vibe score is not finite");
            return Err(ValidationError::OutOfBounds);
        }

        if let Some(state) = &observation.vibe_state {
            if !state.energy_in_bounds() {
                warn!(energy_level = state.energy_level, "energy level out of bounds");
                return Err(ValidationError::OutOfBounds);
            }
        }

        Ok(())
    }

    pub fn inspect(&self, observation: &Observation) -> Verdict {
        self.check(observation).into()
    }
}
