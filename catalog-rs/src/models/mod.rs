//! Regional data model

pub mod regional;
pub mod sync_report;

pub use regional::{ExternalId, ExternalRegionalRecord, Regional};
pub use sync_report::SyncReport;
