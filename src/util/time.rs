use chrono::{DateTime, NaiveDate, NaiveTime};

/// Calendar date in `YYYY-MM-DD` form.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// RFC3339 timestamp with an explicit offset.
pub fn is_rfc3339(input: &str) -> bool {
    DateTime::parse_from_rfc3339(input).is_ok()
}

/// Wall-clock time as `HH:MM:SS` (optionally fractional) or `HH:MM`.
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(input, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .ok()
}
