//! Database schema migrations
//!
//! Versioned, idempotent migrations tracked in the `schema_version` table.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - They must remain stable for users upgrading from older versions
//! 2. **Always add new migrations** - Create a new migration function for each schema change
//! 3. **Use ALTER TABLE / CREATE INDEX IF NOT EXISTS** - Preserve existing data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Name of the opt-in partial unique index on active external ids
pub const SINGLE_ACTIVE_INDEX: &str = "ux_regional_external_id_active";

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

/// Set schema version in database
async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    info!("All migrations completed successfully");
    Ok(())
}

/// Migration v1: index the active-set lookup on regional
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: Add (external_id, ativo) index to regional");

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_regional_external_id_ativo ON regional (external_id, ativo)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Enforce at most one active row per external id at the storage level
///
/// Not applied by default: concurrent sync runs are lock-free unless an
/// integrator opts in. Fails with a database error if the table already
/// holds duplicate active rows; a sync run repairs those first.
pub async fn ensure_single_active_index(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON regional (external_id) \
         WHERE ativo = 1 AND external_id IS NOT NULL",
        SINGLE_ACTIVE_INDEX
    ))
    .execute(pool)
    .await?;

    info!("Single-active constraint enabled on regional.external_id");
    Ok(())
}

/// Remove the single-active index if present
pub async fn drop_single_active_index(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&format!("DROP INDEX IF EXISTS {}", SINGLE_ACTIVE_INDEX))
        .execute(pool)
        .await?;

    Ok(())
}

/// Whether the single-active index currently exists
pub async fn has_single_active_index(pool: &SqlitePool) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?)",
    )
    .bind(SINGLE_ACTIVE_INDEX)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}
