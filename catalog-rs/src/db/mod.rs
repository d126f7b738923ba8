//! Local store for regional records
//!
//! The reconciliation engine talks to persistence through two traits:
//! [`RegionalStore`] opens units of work and serves plain lookups, and
//! [`RegionalUnitOfWork`] scopes the active-set read and every write of one
//! sync run to a single transaction. Dropping a unit of work without calling
//! [`RegionalUnitOfWork::commit`] rolls it back.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Regional;

pub mod regionals;

pub use regionals::SqliteRegionalStore;

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Update addressed a row that does not exist
    #[error("Regional not found: {0}")]
    NotFound(i64),
}

/// Transaction-scoped access used by a single sync run
#[async_trait]
pub trait RegionalUnitOfWork: Send {
    /// All active regionals, including locally created ones
    async fn find_active(&mut self) -> Result<Vec<Regional>, StoreError>;

    /// Insert when `id` is `None`, otherwise persist the `active` flag
    ///
    /// Name and creation time are immutable once stored.
    async fn save(&mut self, regional: Regional) -> Result<Regional, StoreError>;

    async fn save_all(&mut self, regionals: Vec<Regional>) -> Result<Vec<Regional>, StoreError> {
        let mut saved = Vec::with_capacity(regionals.len());
        for regional in regionals {
            saved.push(self.save(regional).await?);
        }
        Ok(saved)
    }

    /// Make every write of this unit of work visible atomically
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Regional persistence
#[async_trait]
pub trait RegionalStore: Send + Sync {
    /// Open a unit of work (a database transaction)
    async fn begin(&self) -> Result<Box<dyn RegionalUnitOfWork>, StoreError>;

    /// Lookup by primary key, active or retired
    async fn find_by_id(&self, id: i64) -> Result<Option<Regional>, StoreError>;

    /// One page of active regionals ordered by id
    async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<Regional>, StoreError>;

    async fn count_active(&self) -> Result<i64, StoreError>;
}
