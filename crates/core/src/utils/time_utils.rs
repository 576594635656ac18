use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Default timezone for activity dates.
/// This is the canonical timezone used to convert broker timestamps to
/// domain dates. The broker's exchanges settle in America/Toronto.
pub const DEFAULT_ACTIVITY_TZ: Tz = chrono_tz::America::Toronto;

/// Converts a UTC instant to an activity date in the given timezone.
///
/// This is the single source of truth for converting instants to "business
/// dates". Use this whenever a date key is derived from a timestamp.
pub fn activity_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Parses a broker-supplied timestamp string into a UTC instant.
///
/// Accepts, in order: RFC 3339 (the usual broker payload format, with
/// offset), a naive `YYYY-MM-DDTHH:MM:SS[.frac]` datetime, a naive
/// `YYYY-MM-DD HH:MM:SS` datetime, and a bare `YYYY-MM-DD` date. Naive
/// values are interpreted in `tz`.
pub fn parse_broker_timestamp(value: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            // Should not happen for typical date ranges
            break;
        }
    }
    days
}
