//! SurrealDB schema migrations and initialization
//!
//! Sets up the gem table with its indexes. Safe to run on every connection.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StateError;
use crate::Result;

/// Initialize all Aether tables in SurrealDB
///
/// This should be called once on first connection to set up the schema.
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing Aether SurrealDB schema");
    init_gems_table(db).await?;
    info!("Aether schema initialization complete");
    Ok(())
}

/// Initialize `gems` table with constraints and indexes
///
/// Schema:
/// ```text
/// TABLE gems {
///   gem_id:          STRING (unique)
///   text:            STRING
///   usage_count:     INT
///   last_synced:     DATETIME (indexed)
///   ritual_tag:      STRING
///   vibe_score:      FLOAT
///   emotional_tone:  STRING
///   tags:            ARRAY<STRING>
/// }
/// ```
///
/// `last_synced` and `usage_count` are indexed for the retention scan.
async fn init_gems_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing gems table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS gems SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS idx_gem_id ON TABLE gems COLUMNS gem_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_gem_last_synced ON TABLE gems COLUMNS last_synced;
        DEFINE INDEX IF NOT EXISTS idx_gem_usage ON TABLE gems COLUMNS usage_count;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StateError::SchemaSetup(format!("gems table: {e}")))?
        .check()
        .map_err(|e| StateError::SchemaSetup(format!("gems table: {e}")))?;

    Ok(())
}
