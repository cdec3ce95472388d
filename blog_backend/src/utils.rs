//! Shared helpers and constants.

use chrono::{SecondsFormat, Utc};

pub const APP_NAME: &str = "blog_backend";

/// Fixed-width RFC 3339 timestamp so stored values sort lexically.
pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
