use chrono::{DateTime, NaiveDateTime, Utc};

const MINUTE_SECS: i64 = 60;
const HOUR_SECS: i64 = 60 * MINUTE_SECS;
const DAY_SECS: i64 = 24 * HOUR_SECS;
const WEEK_SECS: i64 = 7 * DAY_SECS;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Parse an API timestamp.
/// The backend emits naive ISO timestamps in UTC; RFC 3339 is accepted too.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn plural(n: i64, unit: &str) -> String {
    if n > 1 {
        format!("{} {}s ago", n, unit)
    } else {
        format!("{} {} ago", n, unit)
    }
}

/// Format a timestamp relative to `now`, e.g. "5 minutes ago".
/// Older than a week falls back to an absolute date and time.
pub fn format_relative(value: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return "Never".to_string();
    };
    let Some(at) = parse_timestamp(value) else {
        return value.to_string();
    };

    let secs = (now - at).num_seconds();
    if secs < MINUTE_SECS {
        // Includes small clock skew into the future
        "Just now".to_string()
    } else if secs < HOUR_SECS {
        plural(secs / MINUTE_SECS, "minute")
    } else if secs < DAY_SECS {
        plural(secs / HOUR_SECS, "hour")
    } else if secs < WEEK_SECS {
        plural(secs / DAY_SECS, "day")
    } else {
        at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Normalize a device/camera status for display
pub fn status_label(status: Option<&str>) -> String {
    status.unwrap_or("unknown").to_lowercase()
}

/// Normalize an alert severity for display
pub fn severity_label(severity: Option<&str>) -> String {
    severity.unwrap_or("info").to_lowercase()
}
