//! Regional reconciliation decision logic
//!
//! Three pure stages, run in order by the sync service:
//! 1. [`index_external`] keys the external snapshot by external id.
//! 2. [`group_active_by_external_id`] groups the local active set.
//! 3. [`plan_reconciliation`] decides the retirements and insertions that
//!    make the local active set match the snapshot.
//!
//! Names are compared exactly (case-sensitive). Records without an external
//! id never enter any stage.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::models::{ExternalId, ExternalRegionalRecord, Regional, SyncReport};

/// External snapshot keyed by external id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalIndex {
    names: BTreeMap<ExternalId, String>,
    /// Entries dropped for lacking an id
    pub skipped_without_id: usize,
    /// Entries that overwrote an earlier entry with the same id
    pub duplicate_ids: usize,
}

impl ExternalIndex {
    pub fn get(&self, external_id: ExternalId) -> Option<&str> {
        self.names.get(&external_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries in ascending external id order
    pub fn iter(&self) -> impl Iterator<Item = (ExternalId, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

/// Active local regionals grouped by external id
pub type LocalGroups = BTreeMap<ExternalId, Vec<Regional>>;

/// Mutations computed for one sync run
#[derive(Debug, Clone, Default)]
pub struct ReconciliationPlan {
    /// Previously active rows, already marked inactive
    pub retirements: Vec<Regional>,
    /// New active rows, not yet persisted
    pub insertions: Vec<Regional>,
    /// Retirements caused by duplicate active rows rather than external change
    pub repaired: usize,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.retirements.is_empty() && self.insertions.is_empty()
    }

    pub fn report(&self) -> SyncReport {
        let mut report = SyncReport::new();
        report.record_retired(self.retirements.len() as u64);
        for _ in &self.insertions {
            report.record_inserted();
        }
        report
    }
}

/// Key the snapshot by external id
///
/// Entries without an id are skipped. When an id repeats, the entry that
/// appears last in the snapshot wins.
pub fn index_external(snapshot: Vec<ExternalRegionalRecord>) -> ExternalIndex {
    let mut index = ExternalIndex::default();

    for record in snapshot {
        let Some(external_id) = record.external_id else {
            index.skipped_without_id += 1;
            continue;
        };
        if index.names.insert(external_id, record.name).is_some() {
            index.duplicate_ids += 1;
        }
    }

    index
}

/// Group active locals by external id, leaving out locally created records
pub fn group_active_by_external_id(active: Vec<Regional>) -> LocalGroups {
    let mut groups = LocalGroups::new();

    for regional in active.into_iter().filter(|r| r.active) {
        if let Some(external_id) = regional.external_id {
            groups.entry(external_id).or_default().push(regional);
        }
    }

    groups
}

/// Decide the mutations that reconcile `locals` with `external`
///
/// Per external id:
/// - a local with the same name survives, any other active local for that id
///   is retired;
/// - no local at all means one insertion;
/// - locals that all differ in name are retired and one insertion replaces
///   them (rename).
///
/// Groups whose id is absent from the snapshot are retired entirely.
/// New rows are stamped with `now`.
pub fn plan_reconciliation(
    external: &ExternalIndex,
    mut locals: LocalGroups,
    now: DateTime<Utc>,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();

    for (external_id, external_name) in external.iter() {
        let group = locals.remove(&external_id).unwrap_or_default();

        match group.iter().position(|local| local.name == external_name) {
            Some(keep) => {
                for (i, mut local) in group.into_iter().enumerate() {
                    if i != keep {
                        local.retire();
                        plan.retirements.push(local);
                        plan.repaired += 1;
                    }
                }
            }
            None => {
                for mut local in group {
                    local.retire();
                    plan.retirements.push(local);
                }
                plan.insertions
                    .push(Regional::new_at(Some(external_id), external_name, now));
            }
        }
    }

    // Whatever is left has no counterpart in the snapshot
    for (_, group) in locals {
        for mut local in group {
            local.retire();
            plan.retirements.push(local);
        }
    }

    plan
}
