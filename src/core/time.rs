use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

pub fn now_utc() -> DateTime<Utc> {
    if let Ok(value) = std::env::var("SCAM_RADAR_FIXED_TIME") {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return dt.with_timezone(&Utc);
        }
    }
    Utc::now()
}

/// Unix-seconds cutoff for a window of `days` ending at `now`.
pub fn window_cutoff(now: DateTime<Utc>, days: u32) -> i64 {
    (now - Duration::days(days as i64)).timestamp()
}

/// UTC calendar day of a Unix timestamp, `None` when out of range.
pub fn utc_day(ts: i64) -> Option<NaiveDate> {
    Utc.timestamp_opt(ts, 0).single().map(|dt| dt.date_naive())
}
