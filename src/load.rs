use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Error, Result};

/// Reports how much work is already queued elsewhere.
#[async_trait]
pub trait LoadProbe: Send + Sync {
    async fn pending_items(&self) -> Result<usize>;
}

/// Probes a local endpoint that answers with a JSON array; only its length
/// is inspected.
pub struct HttpLoadProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpLoadProbe {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl LoadProbe for HttpLoadProbe {
    async fn pending_items(&self) -> Result<usize> {
        let resp = self.client.get(&self.url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::RemoteApi {
                service: "load check",
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::malformed("load check", format!("invalid JSON body: {e}")))?;
        body.as_array()
            .map(Vec::len)
            .ok_or_else(|| Error::malformed("load check", "expected a JSON array"))
    }
}

/// Outcome of a load-gated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoadDecision {
    /// The endpoint reported more items than the threshold.
    Skipped { pending: usize },
    Ran { pending: usize },
}

/// Whether a run should proceed with `pending` items queued.
pub fn should_run(pending: usize, threshold: usize) -> bool {
    pending <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve_once;

    #[tokio::test]
    async fn test_load_check_counts_array_items() {
        let (base, _request) = serve_once(200, "[1,2,3]").await;
        assert_eq!(HttpLoadProbe::new(base).pending_items().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_load_check_rejects_non_array() {
        let (base, _request) = serve_once(200, r#"{"pending":3}"#).await;
        let err = HttpLoadProbe::new(base).pending_items().await.unwrap_err();
        assert!(matches!(err, Error::RemoteApi { status: None, .. }));
    }

    #[tokio::test]
    async fn test_load_check_non_success_is_remote_api_failure() {
        let (base, _request) = serve_once(503, "[]").await;
        let err = HttpLoadProbe::new(base).pending_items().await.unwrap_err();
        assert!(matches!(err, Error::RemoteApi { status: Some(503), .. }));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(should_run(0, 10));
        assert!(should_run(10, 10));
        assert!(!should_run(11, 10));
    }
}
