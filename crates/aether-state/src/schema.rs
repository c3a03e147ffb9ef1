//! Schema definitions for the Aether SurrealDB tables
//!
//! Tables:
//! - gems: realized intents with usage/retention metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::{Gem, GemId};

/// Module for serializing chrono DateTime to SurrealDB datetime format
pub(crate) mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Gem row as stored in SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Gem id (primary key, unique index)
    pub gem_id: String,
    /// The realized intent text
    pub text: String,
    /// Resonance counter
    pub usage_count: u64,
    /// Last store/resonance time
    #[serde(with = "surreal_datetime")]
    pub last_synced: DateTime<Utc>,
    pub ritual_tag: String,
    pub vibe_score: f64,
    pub emotional_tone: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<Gem> for GemRow {
    fn from(gem: Gem) -> Self {
        GemRow {
            id: None,
            gem_id: gem.id.to_string(),
            text: gem.text,
            usage_count: gem.usage_count,
            last_synced: gem.last_synced,
            ritual_tag: gem.ritual_tag,
            vibe_score: gem.vibe_score,
            emotional_tone: gem.emotional_tone,
            tags: gem.tags,
        }
    }
}

impl TryFrom<GemRow> for Gem {
    type Error = StorageError;

    fn try_from(row: GemRow) -> Result<Self, Self::Error> {
        Ok(Gem {
            id: GemId::try_from(row.gem_id)?,
            text: row.text,
            usage_count: row.usage_count,
            last_synced: row.last_synced,
            ritual_tag: row.ritual_tag,
            vibe_score: row.vibe_score,
            emotional_tone: row.emotional_tone,
            tags: row.tags,
        })
    }
}
