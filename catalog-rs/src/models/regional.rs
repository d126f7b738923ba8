//! Regional records, local and external
//!
//! A rename never updates a row in place: the old row is retired and a new
//! active row is inserted, so the table is an append-only history per
//! external id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a regional in the external system of record
pub type ExternalId = i64;

/// A versioned, locally stored regional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regional {
    /// Surrogate key; `None` until the record is first saved
    pub id: Option<i64>,
    /// External identifier; `None` for records created purely locally
    pub external_id: Option<ExternalId>,
    pub name: String,
    /// `true` for the current representative of its external id
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Regional {
    /// Create a new, unsaved, active regional stamped with the current time
    pub fn new(external_id: Option<ExternalId>, name: impl Into<String>) -> Self {
        Self::new_at(external_id, name, catalog_common::time::now())
    }

    /// Create a new, unsaved, active regional with an explicit creation time
    pub fn new_at(
        external_id: Option<ExternalId>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            external_id,
            name: name.into(),
            active: true,
            created_at,
        }
    }

    /// Mark this version as retired (soft delete)
    pub fn retire(&mut self) {
        self.active = false;
    }
}

/// One `{id, nome}` entry of the external snapshot
///
/// Field names follow the external system's JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRegionalRecord {
    #[serde(rename = "id", default)]
    pub external_id: Option<ExternalId>,
    #[serde(rename = "nome")]
    pub name: String,
}

impl ExternalRegionalRecord {
    pub fn new(external_id: ExternalId, name: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id),
            name: name.into(),
        }
    }
}
