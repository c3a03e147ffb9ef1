use tracing::info;

use crate::domain::FallbackResponse;

pub const DIPLOMACY_ACTION: &str = "DIPLOMACY";
pub const FALLBACK_MESSAGE: &str = "I cannot perceive your intent clearly. Please realign.";
pub const FALLBACK_SHADER: &str = "static_noise";

/// Third gate stage: turns a rejection into a fallback the user can see.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diplomat;

impl Diplomat {
    pub fn new() -> Self {
        Self
    }

    /// Never fails.
    pub fn negotiate(&self, reason: &str) -> FallbackResponse {
        info!(reason = %reason, "negotiating fallback");
        FallbackResponse {
            action: DIPLOMACY_ACTION.to_string(),
            message: FALLBACK_MESSAGE.to_string(),
            fallback_shader: FALLBACK_SHADER.to_string(),
            reason: reason.to_string(),
        }
    }
}
