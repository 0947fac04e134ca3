use async_trait::async_trait;

use super::AnalyticsWindow;
use crate::date_util::format_ymd;
use crate::error::{Error, Result};

const METRICS: &str = "ga:sessions";
const DIMENSIONS: &str = "ga:socialNetwork";

/// Source of raw analytics reports for a date window.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Fetch the report for `window` as the API's JSON body.
    async fn fetch(&self, window: &AnalyticsWindow) -> Result<serde_json::Value>;
}

/// Core Reporting API (v3) client: sessions per social network.
pub struct GoogleAnalyticsClient {
    client: reqwest::Client,
    base_url: String,
    view_id: String,
    access_token: String,
}

impl GoogleAnalyticsClient {
    pub fn new(base_url: String, view_id: String, access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            view_id,
            access_token,
        }
    }

    /// Full request URL for `window`, including the access token.
    pub fn request_url(&self, window: &AnalyticsWindow) -> Result<url::Url> {
        let ids = format!("ga:{}", self.view_id);
        let start = format_ymd(window.start_date);
        let end = format_ymd(window.end_date);
        url::Url::parse_with_params(
            &self.base_url,
            [
                ("ids", ids.as_str()),
                ("start-date", start.as_str()),
                ("end-date", end.as_str()),
                ("metrics", METRICS),
                ("dimensions", DIMENSIONS),
                ("access_token", self.access_token.as_str()),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid analytics_url '{}': {e}", self.base_url)))
    }
}

#[async_trait]
impl AnalyticsSource for GoogleAnalyticsClient {
    async fn fetch(&self, window: &AnalyticsWindow) -> Result<serde_json::Value> {
        let url = self.request_url(window)?;
        log::debug!("GET analytics report for {window}");

        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::RemoteApi {
                service: "analytics",
                status: Some(status.as_u16()),
                message: body,
            });
        }

        resp.json()
            .await
            .map_err(|e| Error::malformed("analytics", format!("invalid JSON body: {e}")))
    }
}
