use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Timelike, Utc};

/// Tick timestamps are exchange-local (IST) wall-clock times.
pub type Timestamp = NaiveDateTime;

/// Format of the `timestamp` column and of timestamps embedded in alert text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// IST is UTC+05:30 with no daylight saving.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Convert a UTC instant to IST wall-clock time, truncated to whole seconds.
pub fn to_ist(instant: DateTime<Utc>) -> Timestamp {
    let local = instant.with_timezone(&ist()).naive_local();
    local.with_nanosecond(0).unwrap_or(local)
}

pub fn now_ist() -> Timestamp {
    to_ist(Utc::now())
}

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}
