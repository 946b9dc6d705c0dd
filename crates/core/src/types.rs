/// Seconds since the unix epoch, as written in check-result lines.
pub type UnixSeconds = i64;

/// All metric timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
