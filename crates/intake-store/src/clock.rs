//! Wall-clock helpers shared by the audit log and the idempotency store.

use chrono::Utc;

/// Current time as milliseconds since the epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time formatted as RFC3339 UTC, used on every audit line and
/// error envelope timestamp (§3, §4.9).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
