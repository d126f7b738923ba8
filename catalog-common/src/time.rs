//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
///
/// Single clock used when stamping record creation times.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
