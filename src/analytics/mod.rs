pub mod cache;
pub mod client;
pub mod normalize;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date_util::{self, trailing_range};

pub use cache::retrieve_window_data;
pub use client::{AnalyticsSource, GoogleAnalyticsClient};
pub use normalize::{drop_incomplete_rows, normalize_rows};

/// Collection holding one Analytics Record per fetched window.
pub const ANALYTICS_COLLECTION: &str = "social_media_data";

/// Length of the rolling analytics window.
pub const WINDOW_DAYS: i64 = 30;

/// One normalized analytics row: column name to cell value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The rolling date range used both as the API query and as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsWindow {
    #[serde(with = "ymd")]
    pub start_date: NaiveDate,
    #[serde(with = "ymd")]
    pub end_date: NaiveDate,
}

impl AnalyticsWindow {
    /// The window `[today - 30 days, today]`.
    pub fn ending(today: NaiveDate) -> Self {
        let (start_date, end_date) = trailing_range(today, WINDOW_DAYS);
        Self {
            start_date,
            end_date,
        }
    }

    /// Store query matching the record cached for this window.
    pub fn cache_key(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl std::fmt::Display for AnalyticsWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}..{}",
            date_util::format_ymd(self.start_date),
            date_util::format_ymd(self.end_date)
        )
    }
}

/// Persisted cache entry for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    #[serde(flatten)]
    pub window: AnalyticsWindow,
    pub data: Vec<Row>,
}

mod ymd {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::date_util;

    pub fn serialize<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date_util::format_ymd(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(d)?;
        date_util::parse_ymd(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{s}', expected YYYY-MM-DD")))
    }
}
