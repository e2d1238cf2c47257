/// UTC timestamp used across all crates.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Seconds since the Unix epoch, as carried in processor signature headers.
pub type UnixSeconds = i64;
