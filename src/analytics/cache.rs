use chrono::NaiveDate;

use super::{normalize_rows, AnalyticsRecord, AnalyticsSource, AnalyticsWindow, Row, ANALYTICS_COLLECTION};
use crate::error::Result;
use crate::storage::Database;

/// Return the analytics rows for the 30-day window ending `today`, fetching
/// and caching them on a miss.
///
/// The lookup and the insert are separate statements. Two callers missing on
/// the same window at once will both fetch and both insert, leaving duplicate
/// records; lookups still return the oldest one.
pub async fn retrieve_window_data(
    db: &Database,
    source: &dyn AnalyticsSource,
    today: NaiveDate,
) -> Result<Vec<Row>> {
    let window = AnalyticsWindow::ending(today);

    let cached: Option<AnalyticsRecord> = db
        .find_one(ANALYTICS_COLLECTION, &window.cache_key())
        .await?;
    if let Some(record) = cached {
        log::debug!("Analytics cache hit for {window}");
        return Ok(record.data);
    }

    log::info!("Analytics cache miss for {window}, fetching");
    let report = source.fetch(&window).await?;
    let data = normalize_rows(&report)?;

    let record = AnalyticsRecord { window, data };
    db.insert_one(ANALYTICS_COLLECTION, &record).await?;
    log::info!("Cached {} analytics rows for {window}", record.data.len());

    Ok(record.data)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Analytics source returning a canned report and counting calls.
    pub(crate) struct FakeAnalytics {
        pub calls: Arc<AtomicUsize>,
        pub report: serde_json::Value,
    }

    impl FakeAnalytics {
        pub(crate) fn new() -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                report: json!({
                    "columnHeaders": [{"name": "ga:socialNetwork"}, {"name": "ga:sessions"}],
                    "rows": [["Facebook", "120"], ["Twitter", "45"]]
                }),
            }
        }
    }

    #[async_trait]
    impl AnalyticsSource for FakeAnalytics {
        async fn fetch(&self, _window: &AnalyticsWindow) -> Result<serde_json::Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.report.clone())
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_miss_fetches_once_and_inserts_once() {
        let db = Database::open_memory().await.unwrap();
        let source = FakeAnalytics::new();

        let rows = retrieve_window_data(&db, &source, day(2024, 3, 15)).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["socialNetwork"], json!("Facebook"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(db.count(ANALYTICS_COLLECTION).await.unwrap(), 1);

        let stored: AnalyticsRecord = db
            .find_one(ANALYTICS_COLLECTION, &json!({"start_date": "2024-02-14", "end_date": "2024-03-15"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data, rows);
        assert_eq!(
            stored.data[0].keys().collect::<Vec<_>>(),
            vec!["socialNetwork", "sessions"]
        );
    }

    #[tokio::test]
    async fn test_same_day_second_call_hits_cache() {
        let db = Database::open_memory().await.unwrap();
        let source = FakeAnalytics::new();
        let today = day(2024, 3, 15);

        let first = retrieve_window_data(&db, &source, today).await.unwrap();
        let second = retrieve_window_data(&db, &source, today).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(db.count(ANALYTICS_COLLECTION).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_next_day_misses() {
        let db = Database::open_memory().await.unwrap();
        let source = FakeAnalytics::new();

        retrieve_window_data(&db, &source, day(2024, 3, 15)).await.unwrap();
        retrieve_window_data(&db, &source, day(2024, 3, 16)).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(db.count(ANALYTICS_COLLECTION).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_hit_returns_stored_data_unchanged() {
        let db = Database::open_memory().await.unwrap();
        let today = day(2024, 3, 15);
        db.insert_one(
            ANALYTICS_COLLECTION,
            &json!({
                "start_date": "2024-02-14",
                "end_date": "2024-03-15",
                "data": [{"socialNetwork": "Pinterest", "sessions": "9"}]
            }),
        )
        .await
        .unwrap();
        let source = FakeAnalytics::new();

        let rows = retrieve_window_data(&db, &source, today).await.unwrap();
        assert_eq!(rows[0]["socialNetwork"], json!("Pinterest"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_report_is_not_cached() {
        let db = Database::open_memory().await.unwrap();
        let mut source = FakeAnalytics::new();
        source.report = json!({"kind": "analytics#gaData"});

        let err = retrieve_window_data(&db, &source, day(2024, 3, 15)).await.unwrap_err();
        assert!(matches!(err, Error::RemoteApi { .. }));
        assert_eq!(db.count(ANALYTICS_COLLECTION).await.unwrap(), 0);
    }
}
