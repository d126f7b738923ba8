//! Regional sync service
//!
//! Runs one reconciliation of the local regional table against the external
//! snapshot:
//! fetch snapshot -> open unit of work -> read active set -> plan -> apply
//! retirements then insertions -> commit.
//!
//! The fetch completes before the store is touched, so a fetch failure leaves
//! local state as it was. Every store read and write of a run shares one
//! transaction; any store error rolls the whole run back.
//!
//! Runs are lock-free by default. Two concurrent runs can both see "no active
//! row" for an external id and both insert one. Callers that trigger syncs
//! concurrently should enable [`RegionalSyncService::with_serialized_runs`],
//! the storage-level single-active index, or both.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::reconciler::{group_active_by_external_id, index_external, plan_reconciliation};
use super::regionais_client::{ExternalFetchError, RegionalSource};
use crate::db::{RegionalStore, StoreError};
use crate::models::{ExternalRegionalRecord, SyncReport};

/// Sync run failures
#[derive(Debug, Error)]
pub enum SyncError {
    /// Snapshot could not be fetched; nothing was written
    #[error("External fetch failed: {0}")]
    ExternalFetch(#[from] ExternalFetchError),

    /// Local persistence failed; the run was rolled back
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Reconciles local regionals against the external source
pub struct RegionalSyncService {
    store: Arc<dyn RegionalStore>,
    source: Arc<dyn RegionalSource>,
    run_lock: Option<Mutex<()>>,
}

impl RegionalSyncService {
    pub fn new(store: Arc<dyn RegionalStore>, source: Arc<dyn RegionalSource>) -> Self {
        Self {
            store,
            source,
            run_lock: None,
        }
    }

    /// Serialize runs of this service instance (single-flight per process)
    pub fn with_serialized_runs(mut self, enabled: bool) -> Self {
        self.run_lock = enabled.then(|| Mutex::new(()));
        self
    }

    pub fn serializes_runs(&self) -> bool {
        self.run_lock.is_some()
    }

    pub fn source(&self) -> &Arc<dyn RegionalSource> {
        &self.source
    }

    /// Fetch the external snapshot and reconcile against it
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        info!("Starting regional sync");
        let snapshot = self.source.fetch_all().await.map_err(|e| {
            warn!("Regional sync aborted, external fetch failed: {}", e);
            SyncError::ExternalFetch(e)
        })?;

        self.reconcile(snapshot).await
    }

    /// Reconcile against an already fetched snapshot
    pub async fn reconcile(
        &self,
        snapshot: Vec<ExternalRegionalRecord>,
    ) -> Result<SyncReport, SyncError> {
        let _guard = match &self.run_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let started = Instant::now();
        let snapshot_len = snapshot.len();
        let index = index_external(snapshot);

        if index.skipped_without_id > 0 {
            warn!(
                skipped = index.skipped_without_id,
                "External snapshot contained entries without id"
            );
        }
        if index.duplicate_ids > 0 {
            warn!(
                duplicates = index.duplicate_ids,
                "External snapshot repeated ids, keeping the last occurrence"
            );
        }

        let mut uow = self.store.begin().await?;

        let active = uow.find_active().await?;
        let active_len = active.len();
        let groups = group_active_by_external_id(active);

        let plan = plan_reconciliation(&index, groups, catalog_common::time::now());
        if plan.repaired > 0 {
            warn!(
                repaired = plan.repaired,
                "Retiring duplicate active regionals"
            );
        }
        for regional in &plan.retirements {
            debug!(id = ?regional.id, external_id = ?regional.external_id, name = %regional.name, "Retire");
        }
        for regional in &plan.insertions {
            debug!(external_id = ?regional.external_id, name = %regional.name, "Insert");
        }

        let report = plan.report();

        // Retire before insert so a single-active index never sees two active rows
        uow.save_all(plan.retirements).await?;
        uow.save_all(plan.insertions).await?;
        uow.commit().await?;

        info!(
            external = snapshot_len,
            active_before = active_len,
            inserted = report.inserted_count(),
            retired = report.retired_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Regional sync complete"
        );

        Ok(report)
    }
}
