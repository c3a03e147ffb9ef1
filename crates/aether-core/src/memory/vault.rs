//! The gem vault: upsert, read, and resonance on top of a [`GemStore`].

use std::sync::Arc;

use aether_state::{Gem, GemFilter, GemId, GemStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::error::{MemoryError, MemoryResult};

pub const DEFAULT_USAGE_COUNT: u64 = 1;
pub const DEFAULT_TONE: &str = "NEUTRAL";

/// Optional fields for [`Vault::store_gem`]. Absent fields keep the stored
/// value when the gem exists, or take a default when it is new.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GemMetadata {
    pub id: Option<GemId>,
    pub usage_count: Option<u64>,
    pub last_synced: Option<DateTime<Utc>>,
    pub ritual_tag: Option<String>,
    pub vibe_score: Option<f64>,
    pub emotional_tone: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl GemMetadata {
    pub fn with_id(id: GemId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

/// Owns gem persistence. Callers only ever see copies.
#[derive(Clone)]
pub struct Vault {
    store: Arc<dyn GemStore>,
}

impl Vault {
    pub fn new(store: Arc<dyn GemStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn GemStore> {
        &self.store
    }

    /// Upsert a gem and return its id. A new id is generated when
    /// `metadata.id` is absent.
    pub async fn store_gem(&self, text: &str, metadata: GemMetadata) -> MemoryResult<GemId> {
        let id = metadata.id.clone().unwrap_or_default();
        let existing = self.store.get(&id).await?;

        let gem = match existing {
            Some(current) => merge(current, text, metadata),
            None => Gem {
                id: id.clone(),
                text: text.to_string(),
                usage_count: metadata.usage_count.unwrap_or(DEFAULT_USAGE_COUNT),
                last_synced: metadata.last_synced.unwrap_or_else(Utc::now),
                ritual_tag: metadata
                    .ritual_tag
                    .unwrap_or_else(|| crate::gate::DEFAULT_RITUAL_TAG.to_string()),
                vibe_score: metadata.vibe_score.unwrap_or(0.0),
                emotional_tone: metadata
                    .emotional_tone
                    .unwrap_or_else(|| DEFAULT_TONE.to_string()),
                tags: metadata.tags.unwrap_or_default(),
            },
        };

        self.store.upsert(gem).await?;
        info!(gem_id = %id, preview = %preview(text), "stored gem");
        Ok(id)
    }

    /// Increment usage and refresh `last_synced`. Fails with
    /// [`MemoryError::GemNotFound`] for unknown ids.
    pub async fn resonate(&self, id: &GemId) -> MemoryResult<Gem> {
        self.store
            .increment_usage(id, Utc::now())
            .await?
            .ok_or_else(|| MemoryError::GemNotFound { id: id.to_string() })
    }

    /// Like [`Vault::resonate`] but never fails: unknown ids and storage
    /// errors are logged and dropped. Call [`Vault::get`] first if you need
    /// confirmation.
    pub async fn update_resonance(&self, id: &GemId) {
        match self.resonate(id).await {
            Ok(gem) => debug!(gem_id = %id, usage_count = gem.usage_count, "resonance amplified"),
            Err(MemoryError::GemNotFound { .. }) => {
                warn!(gem_id = %id, "resonance update for unknown gem ignored")
            }
            Err(e) => error!(gem_id = %id, error = %e, "failed to update resonance"),
        }
    }

    pub async fn get(&self, id: &GemId) -> MemoryResult<Option<Gem>> {
        Ok(self.store.get(id).await?)
    }

    /// Every gem, in no particular order.
    pub async fn list_all(&self) -> MemoryResult<Vec<Gem>> {
        self.list(&GemFilter::all()).await
    }

    pub async fn list(&self, filter: &GemFilter) -> MemoryResult<Vec<Gem>> {
        Ok(self.store.scan(filter).await?)
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}

fn merge(mut gem: Gem, text: &str, metadata: GemMetadata) -> Gem {
    gem.text = text.to_string();
    if let Some(usage_count) = metadata.usage_count {
        gem.usage_count = usage_count;
    }
    if let Some(last_synced) = metadata.last_synced {
        gem.last_synced = last_synced;
    }
    if let Some(ritual_tag) = metadata.ritual_tag {
        gem.ritual_tag = ritual_tag;
    }
    if let Some(vibe_score) = metadata.vibe_score {
        gem.vibe_score = vibe_score;
    }
    if let Some(emotional_tone) = metadata.emotional_tone {
        gem.emotional_tone = emotional_tone;
    }
    if let Some(tags) = metadata.tags {
        gem.tags = tags;
    }
    gem
}

fn preview(text: &str) -> String {
    text.chars().take(20).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_state::MemoryGemStore;

    fn vault() -> (Vault, Arc<MemoryGemStore>) {
        let store = Arc::new(MemoryGemStore::new());
        (Vault::new(store.clone()), store)
    }

    #[tokio::test]
    async fn store_gem_applies_defaults() {
        let (vault, _) = vault();
        let id = vault.store_gem("hello", GemMetadata::default()).await.unwrap();
        let gem = vault.get(&id).await.unwrap().unwrap();

        assert_eq!(gem.usage_count, 1);
        assert_eq!(gem.ritual_tag, "normal");
        assert_eq!(gem.emotional_tone, "NEUTRAL");
        assert!((Utc::now() - gem.last_synced).num_seconds() < 5);
    }

    #[tokio::test]
    async fn same_id_overwrites_supplied_fields_only() {
        let (vault, store) = vault();
        let id = GemId::try_from("gem-1").unwrap();
        let mut first = GemMetadata::with_id(id.clone());
        first.usage_count = Some(7);
        first.ritual_tag = Some("confirmed".into());
        vault.store_gem("first", first).await.unwrap();

        let mut second = GemMetadata::with_id(id.clone());
        second.vibe_score = Some(0.5);
        vault.store_gem("second", second).await.unwrap();

        assert_eq!(store.len(), 1);
        let gem = vault.get(&id).await.unwrap().unwrap();
        assert_eq!(gem.text, "second");
        assert_eq!(gem.usage_count, 7);
        assert_eq!(gem.ritual_tag, "confirmed");
        assert_eq!(gem.vibe_score, 0.5);
    }

    #[tokio::test]
    async fn update_resonance_unknown_id_is_silent() {
        let (vault, store) = vault();
        vault
            .update_resonance(&GemId::try_from("ghost").unwrap())
            .await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn resonate_reports_missing_gem() {
        let (vault, _) = vault();
        let err = vault
            .resonate(&GemId::try_from("ghost").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::GemNotFound { .. }));
    }

    #[tokio::test]
    async fn update_resonance_increments() {
        let (vault, _) = vault();
        let id = vault.store_gem("x", GemMetadata::default()).await.unwrap();
        vault.update_resonance(&id).await;
        vault.update_resonance(&id).await;
        assert_eq!(vault.get(&id).await.unwrap().unwrap().usage_count, 3);
        assert_eq!(vault.list_all().await.unwrap().len(), 1);
    }
}
