//! The retention ritual: batch eviction of stale, rarely used gems.

use std::sync::Arc;

use aether_state::{Gem, GemFilter, GemId, GemStore};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::audit::{AuditEvent, AuditSink};
use crate::obs;

use super::error::MemoryResult;

pub const DEFAULT_RETENTION_DAYS: u32 = 15;
pub const DEFAULT_MIN_USAGE: u64 = 3;
/// Upper bound accepted by configuration, a century.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Which gems the ritual may release.
///
/// A gem is stale when it is older than `retention_days` whole days AND has
/// been used fewer than `min_usage` times. Both conditions are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub retention_days: u32,
    pub min_usage: u64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            min_usage: DEFAULT_MIN_USAGE,
        }
    }
}

impl RetentionPolicy {
    pub fn new(retention_days: u32, min_usage: u64) -> Self {
        Self {
            retention_days,
            min_usage,
        }
    }

    /// Age in whole days, truncated: 23 hours is 0 days.
    pub fn age_days(gem: &Gem, now: DateTime<Utc>) -> i64 {
        (now - gem.last_synced).num_days()
    }

    pub fn is_stale(&self, gem: &Gem, now: DateTime<Utc>) -> bool {
        Self::age_days(gem, now) > i64::from(self.retention_days)
            && gem.usage_count < self.min_usage
    }

    /// Store-side filter equivalent to [`RetentionPolicy::is_stale`].
    ///
    /// `age_days > R` with truncation holds exactly when
    /// `last_synced <= now - (R + 1) days`. A cutoff before the earliest
    /// representable time means no gem can qualify, so the filter matches
    /// nothing.
    pub fn stale_filter(&self, now: DateTime<Utc>) -> GemFilter {
        let cutoff = Duration::try_days(i64::from(self.retention_days) + 1)
            .and_then(|age| now.checked_sub_signed(age));
        match cutoff {
            Some(cutoff) => GemFilter {
                synced_at_or_before: Some(cutoff),
                usage_below: Some(self.min_usage),
            },
            None => GemFilter {
                synced_at_or_before: None,
                usage_below: Some(0),
            },
        }
    }
}

/// Outcome label of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanseStatus {
    /// The store was empty.
    Clean,
    /// At least one gem was released.
    Purified,
    /// Nothing qualified.
    Stable,
}

impl CleanseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanseStatus::Clean => "clean",
            CleanseStatus::Purified => "purified",
            CleanseStatus::Stable => "stable",
        }
    }
}

impl std::fmt::Display for CleanseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanseReport {
    pub status: CleanseStatus,
    pub deleted_count: usize,
    /// Gems marked stale by the scan. A marked gem that resonated before the
    /// delete ran survives and is not counted in `deleted_count`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marked_ids: Vec<GemId>,
}

impl CleanseReport {
    fn clean() -> Self {
        Self {
            status: CleanseStatus::Clean,
            deleted_count: 0,
            marked_ids: Vec::new(),
        }
    }
}

/// Sweeps a [`GemStore`] under a [`RetentionPolicy`].
///
/// A sweep scans once, decides from that snapshot, and deletes the marked ids
/// in one guarded batch. Gems created or resonated after the scan are never
/// deleted by that sweep. Re-running with the same `now` deletes nothing new.
pub struct RetentionRitual {
    store: Arc<dyn GemStore>,
    policy: RetentionPolicy,
    audit: Arc<dyn AuditSink>,
}

impl RetentionRitual {
    pub fn new(
        store: Arc<dyn GemStore>,
        policy: RetentionPolicy,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            policy,
            audit,
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub async fn cleanse_entropy(&self) -> MemoryResult<CleanseReport> {
        self.cleanse_entropy_at(Utc::now()).await
    }

    /// Sweep as if the current time were `now`.
    pub async fn cleanse_entropy_at(&self, now: DateTime<Utc>) -> MemoryResult<CleanseReport> {
        info!(
            retention_days = self.policy.retention_days,
            min_usage = self.policy.min_usage,
            "scanning vault for stale gems"
        );
        let gems = self.store.scan(&GemFilter::all()).await?;
        let scanned = gems.len();

        let report = if gems.is_empty() {
            info!("vault is empty, nothing to release");
            CleanseReport::clean()
        } else {
            let marked_ids: Vec<GemId> = gems
                .iter()
                .filter(|gem| self.policy.is_stale(gem, now))
                .inspect(|gem| {
                    debug!(
                        gem_id = %gem.id,
                        age_days = RetentionPolicy::age_days(gem, now),
                        usage_count = gem.usage_count,
                        "marking gem for release"
                    )
                })
                .map(|gem| gem.id.clone())
                .collect();

            let deleted_count = if marked_ids.is_empty() {
                0
            } else {
                self.store
                    .delete_many(&marked_ids, &self.policy.stale_filter(now))
                    .await?
            };

            let status = if deleted_count > 0 {
                CleanseStatus::Purified
            } else {
                CleanseStatus::Stable
            };
            CleanseReport {
                status,
                deleted_count,
                marked_ids,
            }
        };

        obs::emit_ritual_completed(report.status.as_str(), scanned, report.deleted_count);
        self.audit.record(AuditEvent::new(
            "ritual",
            "Cleanse",
            report.status.as_str(),
            json!({
                "scanned": scanned,
                "deleted_count": report.deleted_count,
                "retention_days": self.policy.retention_days,
                "min_usage": self.policy.min_usage,
            }),
        ));
        Ok(report)
    }
}

impl std::fmt::Debug for RetentionRitual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionRitual")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
