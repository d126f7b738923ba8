//! Outcome of one sync run

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counts of rows inserted and retired by a single sync run
///
/// Counters start at zero and only grow during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    inserted_count: u64,
    retired_count: u64,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inserted_count(&self) -> u64 {
        self.inserted_count
    }

    pub fn retired_count(&self) -> u64 {
        self.retired_count
    }

    pub fn record_inserted(&mut self) {
        self.inserted_count += 1;
    }

    pub fn record_retired(&mut self, count: u64) {
        self.retired_count += count;
    }

    /// True when the run changed nothing
    pub fn is_noop(&self) -> bool {
        self.inserted_count == 0 && self.retired_count == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} retired",
            self.inserted_count, self.retired_count
        )
    }
}
