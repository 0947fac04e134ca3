use chrono::{Duration, NaiveDate};

/// Date format used for analytics query parameters and cache keys.
pub const YMD: &str = "%Y-%m-%d";

/// Inclusive `[today - days, today]` range.
pub fn trailing_range(today: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(days), today)
}

pub fn format_ymd(d: NaiveDate) -> String {
    d.format(YMD).to_string()
}

pub fn parse_ymd(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, YMD).ok()
}
