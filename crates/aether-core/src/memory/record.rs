use aether_state::GemId;
use chrono::Utc;
use tracing::info;

use crate::domain::PhysicsParams;
use crate::obs;

use super::error::MemoryResult;
use super::vault::{GemMetadata, Vault, DEFAULT_USAGE_COUNT};

/// Persist a transmuted intent as a fresh gem.
///
/// Always generates a new id; resubmitting the same params creates a second
/// gem.
pub async fn commit_change(
    vault: &Vault,
    params: &PhysicsParams,
    original_text: &str,
    ritual_tag: &str,
) -> MemoryResult<GemId> {
    let metadata = GemMetadata {
        id: Some(GemId::new()),
        usage_count: Some(DEFAULT_USAGE_COUNT),
        last_synced: Some(Utc::now()),
        ritual_tag: Some(ritual_tag.to_string()),
        vibe_score: Some(params.vibe_score),
        emotional_tone: Some(params.emotional_tone.as_str().to_string()),
        tags: None,
    };

    let id = vault.store_gem(original_text, metadata).await?;
    obs::emit_gem_committed(id.as_str(), ritual_tag);
    info!(gem_id = %id, ritual_tag = %ritual_tag, "record committed");
    Ok(id)
}
