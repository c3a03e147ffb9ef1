//! SurrealDB-backed GemStore implementation
//!
//! Uses `schema::GemRow` for persistence, converting to/from
//! `storage_traits::Gem` at the boundary.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use surrealdb::engine::any::Any;
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::error::{StateError, StorageError};
use crate::migrations;
use crate::schema::GemRow;
use crate::storage_traits::{Gem, GemFilter, GemId, GemStore, StorageResult};

const NAMESPACE: &str = "aether";
const DATABASE: &str = "vault";

/// SurrealDB-backed implementation of [`GemStore`].
#[derive(Clone)]
pub struct SurrealGemStore {
    db: Surreal<Any>,
}

impl SurrealGemStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `aether/vault`, and runs `init_schema`.
    pub async fn in_memory() -> crate::Result<Self> {
        let store = Self::connect("mem://").await?;
        info!("SurrealGemStore connected (in-memory)");
        Ok(store)
    }

    /// Open (or create) a persistent store rooted at `persist_path`.
    #[instrument(skip_all, fields(path = %persist_path.as_ref().display()))]
    pub async fn open(persist_path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = persist_path.as_ref();
        std::fs::create_dir_all(path).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {}: {}",
                path.display(),
                e
            ))
        })?;
        let url = format!("surrealkv://{}", path.display());
        let store = Self::connect(&url).await?;
        info!("SurrealGemStore connected ({})", url);
        Ok(store)
    }

    async fn connect(url: &str) -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        Ok(Self { db })
    }

    // -- private helpers -----------------------------------------------------

    /// Fetch a gem row by id.
    async fn fetch_row(&self, gid: &str) -> StorageResult<Option<GemRow>> {
        let gid_owned = gid.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM gems WHERE gem_id = $gid")
            .bind(("gid", gid_owned))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<GemRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    /// Render `filter` as a SurrealQL condition list plus its bindings.
    fn filter_clauses(
        filter: &GemFilter,
    ) -> (Vec<&'static str>, Option<SurrealDatetime>, Option<u64>) {
        let mut clauses = Vec::new();
        let cutoff = filter.synced_at_or_before.map(SurrealDatetime::from);
        if cutoff.is_some() {
            clauses.push("last_synced <= $cutoff");
        }
        if filter.usage_below.is_some() {
            clauses.push("usage_count < $floor");
        }
        (clauses, cutoff, filter.usage_below)
    }

    fn rows_to_gems(rows: Vec<GemRow>) -> StorageResult<Vec<Gem>> {
        rows.into_iter().map(Gem::try_from).collect()
    }
}

#[async_trait]
impl GemStore for SurrealGemStore {
    async fn upsert(&self, gem: Gem) -> StorageResult<()> {
        let gid = gem.id.to_string();
        let row = GemRow::from(gem);

        if self.fetch_row(&gid).await?.is_some() {
            debug!(gem_id = %gid, "replacing gem");
            self.db
                .query("UPDATE gems CONTENT $row WHERE gem_id = $gid")
                .bind(("row", row))
                .bind(("gid", gid))
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?
                .check()
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        } else {
            debug!(gem_id = %gid, "creating gem");
            let _created: Option<GemRow> = self
                .db
                .create("gems")
                .content(row)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    async fn get(&self, id: &GemId) -> StorageResult<Option<Gem>> {
        self.fetch_row(id.as_str())
            .await?
            .map(Gem::try_from)
            .transpose()
    }

    async fn increment_usage(&self, id: &GemId, at: DateTime<Utc>) -> StorageResult<Option<Gem>> {
        let gid_owned = id.to_string();
        let mut res = self
            .db
            .query(
                "UPDATE gems SET usage_count += 1, last_synced = $at \
                 WHERE gem_id = $gid RETURN AFTER",
            )
            .bind(("gid", gid_owned))
            .bind(("at", SurrealDatetime::from(at)))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<GemRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter().next().map(Gem::try_from).transpose()
    }

    async fn scan(&self, filter: &GemFilter) -> StorageResult<Vec<Gem>> {
        let (clauses, cutoff, floor) = Self::filter_clauses(filter);
        let sql = if clauses.is_empty() {
            "SELECT * FROM gems".to_string()
        } else {
            format!("SELECT * FROM gems WHERE {}", clauses.join(" AND "))
        };

        let mut query = self.db.query(sql);
        if let Some(cutoff) = cutoff {
            query = query.bind(("cutoff", cutoff));
        }
        if let Some(floor) = floor {
            query = query.bind(("floor", floor));
        }

        let mut res = query
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let rows: Vec<GemRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Self::rows_to_gems(rows)
    }

    async fn delete_many(&self, ids: &[GemId], guard: &GemFilter) -> StorageResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let (mut clauses, cutoff, floor) = Self::filter_clauses(guard);
        clauses.insert(0, "gem_id IN $ids");
        let sql = format!("DELETE gems WHERE {} RETURN BEFORE", clauses.join(" AND "));

        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let mut query = self.db.query(sql).bind(("ids", id_strings));
        if let Some(cutoff) = cutoff {
            query = query.bind(("cutoff", cutoff));
        }
        if let Some(floor) = floor {
            query = query.bind(("floor", floor));
        }

        let mut res = query
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let removed: Vec<GemRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        debug!(requested = ids.len(), removed = removed.len(), "batch delete");
        Ok(removed.len())
    }
}
