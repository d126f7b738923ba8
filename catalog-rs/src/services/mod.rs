//! Regional sync services

pub mod reconciler;
pub mod regionais_client;
pub mod regional_sync;

pub use reconciler::{
    group_active_by_external_id, index_external, plan_reconciliation, ExternalIndex, LocalGroups,
    ReconciliationPlan,
};
pub use regionais_client::{
    ExternalFetchError, HttpRegionalClient, RegionalSource, DEFAULT_REGIONAIS_URL,
    DEFAULT_TIMEOUT,
};
pub use regional_sync::{RegionalSyncService, SyncError};
