//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryGemStore`, which satisfies the `GemStore` contract
//! without any external dependencies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryGemStore
// ---------------------------------------------------------------------------

/// In-memory gem store backed by a `HashMap<id, Gem>`.
#[derive(Debug, Default)]
pub struct MemoryGemStore {
    gems: Mutex<HashMap<GemId, Gem>>,
}

impl MemoryGemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of gems currently held.
    pub fn len(&self) -> usize {
        self.gems.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GemStore for MemoryGemStore {
    async fn upsert(&self, gem: Gem) -> StorageResult<()> {
        let mut gems = self.gems.lock().unwrap_or_else(|p| p.into_inner());
        gems.insert(gem.id.clone(), gem);
        Ok(())
    }

    async fn get(&self, id: &GemId) -> StorageResult<Option<Gem>> {
        let gems = self.gems.lock().unwrap_or_else(|p| p.into_inner());
        Ok(gems.get(id).cloned())
    }

    async fn increment_usage(&self, id: &GemId, at: DateTime<Utc>) -> StorageResult<Option<Gem>> {
        let mut gems = self.gems.lock().unwrap_or_else(|p| p.into_inner());
        Ok(gems.get_mut(id).map(|gem| {
            gem.usage_count += 1;
            gem.last_synced = at;
            gem.clone()
        }))
    }

    async fn scan(&self, filter: &GemFilter) -> StorageResult<Vec<Gem>> {
        let gems = self.gems.lock().unwrap_or_else(|p| p.into_inner());
        Ok(gems.values().filter(|g| filter.matches(g)).cloned().collect())
    }

    async fn delete_many(&self, ids: &[GemId], guard: &GemFilter) -> StorageResult<usize> {
        let mut gems = self.gems.lock().unwrap_or_else(|p| p.into_inner());
        let mut removed = 0;
        for id in ids {
            let eligible = gems.get(id).is_some_and(|g| guard.matches(g));
            if eligible && gems.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
