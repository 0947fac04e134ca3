use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::Result;

/// What failed, handed to an [`AlertNotifier`].
#[derive(Debug, Clone)]
pub struct FailureContext {
    pub operation: String,
    pub message: String,
    pub occurred_at: DateTime<Local>,
}

impl FailureContext {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
            occurred_at: Local::now(),
        }
    }
}

/// Pluggable alert sink for failed runs.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, failure: &FailureContext) -> Result<()>;
}

/// Writes alerts to the error log.
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify(&self, failure: &FailureContext) -> Result<()> {
        log::error!(
            "ALERT [{}] {} failed: {}",
            failure.occurred_at.to_rfc3339(),
            failure.operation,
            failure.message
        );
        Ok(())
    }
}

/// Drops alerts.
pub struct NoopNotifier;

#[async_trait]
impl AlertNotifier for NoopNotifier {
    async fn notify(&self, _failure: &FailureContext) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_notifiers_accept_alerts() {
        let failure = FailureContext::new("generate_insights", "completion API failure (500): boom");
        assert_eq!(failure.operation, "generate_insights");
        assert!(LogNotifier.notify(&failure).await.is_ok());
        assert!(NoopNotifier.notify(&failure).await.is_ok());
    }
}
