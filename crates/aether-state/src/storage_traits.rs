//! Storage trait definitions for the gem vault
//!
//! `GemStore` is the "get_or_create collection" boundary: CRUD by id plus a
//! metadata-filtered scan. Everything above it (usage counting, retention,
//! commit helpers) lives in `aether-core`.
//!
//! The trait is async and backend-agnostic. An in-memory fake is provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Opaque unique identifier of a gem
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GemId(String);

impl GemId {
    /// Generate a new random GemId
    pub fn new() -> Self {
        GemId(uuid::Uuid::new_v4().to_string())
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GemId {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<String> for GemId {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.trim().is_empty() {
            return Err(StorageError::InvalidGemId { id: s });
        }
        Ok(GemId(s))
    }
}

impl TryFrom<&str> for GemId {
    type Error = StorageError;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        GemId::try_from(s.to_string())
    }
}

impl std::fmt::Display for GemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted memory record: one realized intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gem {
    pub id: GemId,
    pub text: String,
    /// How many times the gem has resonated (starts at 1)
    pub usage_count: u64,
    /// Last time the gem was stored or resonated
    pub last_synced: DateTime<Utc>,
    pub ritual_tag: String,
    pub vibe_score: f64,
    pub emotional_tone: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Metadata filter for [`GemStore::scan`] and guarded deletes.
///
/// Every populated field must match; an empty filter matches every gem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemFilter {
    /// Only gems whose `last_synced` is at or before this instant
    pub synced_at_or_before: Option<DateTime<Utc>>,
    /// Only gems with `usage_count` strictly below this value
    pub usage_below: Option<u64>,
}

impl GemFilter {
    /// Filter that matches every gem.
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether `gem` satisfies every populated criterion.
    pub fn matches(&self, gem: &Gem) -> bool {
        if let Some(cutoff) = self.synced_at_or_before {
            if gem.last_synced > cutoff {
                return false;
            }
        }
        if let Some(floor) = self.usage_below {
            if gem.usage_count >= floor {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.synced_at_or_before.is_none() && self.usage_below.is_none()
    }
}

/// Gem collection.
///
/// Guarantees:
/// - `upsert` replaces the whole record stored under `gem.id`.
/// - `get` of an absent id is `Ok(None)`, never an error.
/// - `increment_usage` is atomic with respect to other store operations.
/// - `delete_many` is idempotent: absent ids are skipped, not errors.
#[async_trait]
pub trait GemStore: Send + Sync {
    /// Insert or replace a gem.
    async fn upsert(&self, gem: Gem) -> StorageResult<()>;

    /// Fetch a gem by id.
    async fn get(&self, id: &GemId) -> StorageResult<Option<Gem>>;

    /// Add one to `usage_count` and set `last_synced = at`.
    ///
    /// Returns the updated gem, or `None` when the id is unknown (nothing
    /// is created).
    async fn increment_usage(&self, id: &GemId, at: DateTime<Utc>) -> StorageResult<Option<Gem>>;

    /// Return every gem matching `filter` (order unspecified).
    async fn scan(&self, filter: &GemFilter) -> StorageResult<Vec<Gem>>;

    /// Delete the given ids in one batch, restricted to gems that still
    /// match `guard`. Returns how many gems were actually removed.
    async fn delete_many(&self, ids: &[GemId], guard: &GemFilter) -> StorageResult<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn gem(usage: u64, age_days: i64) -> Gem {
        Gem {
            id: GemId::new(),
            text: "t".into(),
            usage_count: usage,
            last_synced: Utc::now() - Duration::days(age_days),
            ritual_tag: "normal".into(),
            vibe_score: 0.0,
            emotional_tone: "NEUTRAL".into(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn empty_gem_id_rejected() {
        assert!(matches!(
            GemId::try_from("  "),
            Err(StorageError::InvalidGemId { .. })
        ));
        assert_eq!(GemId::try_from("gem_a").unwrap().as_str(), "gem_a");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(GemId::new(), GemId::new());
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(GemFilter::all().matches(&gem(100, 0)));
        assert!(GemFilter::all().is_empty());
    }

    #[test]
    fn filter_requires_every_criterion() {
        let filter = GemFilter {
            synced_at_or_before: Some(Utc::now() - Duration::days(10)),
            usage_below: Some(3),
        };
        assert!(filter.matches(&gem(1, 20)));
        assert!(!filter.matches(&gem(5, 20)));
        assert!(!filter.matches(&gem(1, 1)));
    }

    #[test]
    fn gem_id_serializes_as_plain_string() {
        let id = GemId::try_from("gem_vibrant").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"gem_vibrant\"");
    }
}
