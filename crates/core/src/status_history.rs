//! Status-history arithmetic and audit formatting.

use crate::types::{DbId, Timestamp};

/// Field name recorded in the general audit trail for status transitions.
pub const STATUS_FIELD: &str = "status_id";

/// Whole minutes between `start` and `end`, rounded to nearest and clamped
/// at zero so clock skew can never yield a negative duration.
pub fn duration_minutes(start: Timestamp, end: Timestamp) -> i64 {
    let millis = (end - start).num_milliseconds().max(0);
    (millis as f64 / 60_000.0).round() as i64
}

/// Audit rendering of a status: `"{name} ({id})"`.
pub fn status_label(name: &str, id: DbId) -> String {
    format!("{name} ({id})")
}
