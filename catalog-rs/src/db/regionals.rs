//! SQLite-backed regional store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use super::{RegionalStore, RegionalUnitOfWork, StoreError};
use crate::models::{ExternalId, Regional};

const SELECT_COLUMNS: &str = "SELECT id, external_id, nome, ativo, created_at FROM regional";

/// Regional store over the shared catalog database
#[derive(Clone)]
pub struct SqliteRegionalStore {
    pool: SqlitePool,
}

impl SqliteRegionalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every stored version, active and retired, ordered by id
    pub async fn find_all(&self) -> Result<Vec<Regional>, StoreError> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_regional).collect()
    }

    /// Version history of one external id, oldest first
    pub async fn history(&self, external_id: ExternalId) -> Result<Vec<Regional>, StoreError> {
        let rows = sqlx::query(&format!(
            "{} WHERE external_id = ? ORDER BY id",
            SELECT_COLUMNS
        ))
        .bind(external_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_regional).collect()
    }
}

#[async_trait]
impl RegionalStore for SqliteRegionalStore {
    async fn begin(&self) -> Result<Box<dyn RegionalUnitOfWork>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteUnitOfWork { tx }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Regional>, StoreError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_regional).transpose()
    }

    async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<Regional>, StoreError> {
        let rows = sqlx::query(&format!(
            "{} WHERE ativo = 1 ORDER BY id LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_regional).collect()
    }

    async fn count_active(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM regional WHERE ativo = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// One open transaction on the catalog database
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl RegionalUnitOfWork for SqliteUnitOfWork {
    async fn find_active(&mut self) -> Result<Vec<Regional>, StoreError> {
        let rows = sqlx::query(&format!("{} WHERE ativo = 1 ORDER BY id", SELECT_COLUMNS))
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(row_to_regional).collect()
    }

    async fn save(&mut self, mut regional: Regional) -> Result<Regional, StoreError> {
        match regional.id {
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO regional (external_id, nome, ativo, created_at)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(regional.external_id)
                .bind(&regional.name)
                .bind(regional.active)
                .bind(regional.created_at)
                .execute(&mut *self.tx)
                .await?;

                let id = result.last_insert_rowid();
                debug!(id, external_id = ?regional.external_id, "Inserted regional");
                regional.id = Some(id);
            }
            Some(id) => {
                let result = sqlx::query("UPDATE regional SET ativo = ? WHERE id = ?")
                    .bind(regional.active)
                    .bind(id)
                    .execute(&mut *self.tx)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound(id));
                }
                debug!(id, active = regional.active, "Updated regional");
            }
        }

        Ok(regional)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

fn row_to_regional(row: &SqliteRow) -> Result<Regional, StoreError> {
    Ok(Regional {
        id: Some(row.try_get("id")?),
        external_id: row.try_get("external_id")?,
        name: row.try_get("nome")?,
        active: row.try_get("ativo")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
