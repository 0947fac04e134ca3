pub mod alert;
pub mod analytics;
pub mod config;
pub mod crypto;
pub mod date_util;
pub mod error;
pub mod feedback;
pub mod llm;
pub mod load;
pub mod monitor;
pub mod report;
pub mod storage;

#[cfg(test)]
mod test_server;

use chrono::NaiveDate;
use serde::Serialize;

pub use alert::{AlertNotifier, FailureContext, LogNotifier, NoopNotifier};
pub use analytics::{AnalyticsRecord, AnalyticsSource, AnalyticsWindow, GoogleAnalyticsClient, Row};
pub use config::{Credentials, Settings};
pub use error::{Error, Result};
pub use llm::{CompletionClient, CompletionRequest, OpenAiCompletions};
pub use load::{HttpLoadProbe, LoadDecision, LoadProbe};
pub use monitor::PerformanceReport;
pub use storage::Database;

use llm::insights;
use monitor::Stopwatch;

/// Prompt used by the unattended entry points (guarded, monitored and
/// load-gated runs).
pub const DEFAULT_PROMPT: &str = "Test Prompt";

/// Suggestions produced by one full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub ideas: Vec<String>,
    pub reused_content: Vec<String>,
}

impl InsightReport {
    /// Console listing of both suggestion lists.
    pub fn render(&self) -> String {
        let mut out = String::from("Here are some ideas based on the social media data:\n");
        for idea in &self.ideas {
            out.push_str(&format!("- {idea}\n"));
        }
        out.push_str("\nHere is some reused content:\n");
        for content in &self.reused_content {
            out.push_str(&format!("- {content}\n"));
        }
        out
    }
}

/// Main entry point: analytics caching, insight generation and the
/// standalone utilities that share the store.
pub struct SocialAI {
    db: Database,
    analytics: Box<dyn AnalyticsSource>,
    completions: Box<dyn CompletionClient>,
    notifier: Box<dyn AlertNotifier>,
    today: Option<NaiveDate>,
}

impl SocialAI {
    pub fn new(
        db: Database,
        analytics: Box<dyn AnalyticsSource>,
        completions: Box<dyn CompletionClient>,
    ) -> Self {
        Self {
            db,
            analytics,
            completions,
            notifier: Box::new(LogNotifier),
            today: None,
        }
    }

    /// Build the live HTTP clients from credentials and stored settings.
    pub async fn from_config(db: Database, credentials: Credentials) -> Result<Self> {
        let settings = Settings::load(&db).await?;
        let analytics = GoogleAnalyticsClient::new(
            settings.analytics_url,
            settings.analytics_view_id,
            credentials.analytics_token,
        );
        let completions = OpenAiCompletions::new(settings.completion_url, credentials.completion_api_key)
            .with_model(settings.completion_model);
        Ok(Self::new(db, Box::new(analytics), Box::new(completions)))
    }

    pub fn with_notifier(mut self, notifier: Box<dyn AlertNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_fixed_date(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    // ── Analytics and insights ─────────────────────────────────────

    pub async fn retrieve_window_data(&self) -> Result<Vec<Row>> {
        analytics::retrieve_window_data(&self.db, self.analytics.as_ref(), self.today()).await
    }

    pub async fn analyze_trends_and_patterns(&self) -> Result<Vec<String>> {
        insights::analyze_trends_and_patterns(
            &self.db,
            self.analytics.as_ref(),
            self.completions.as_ref(),
            self.today(),
        )
        .await
    }

    pub async fn repurpose_existing_content(&self) -> Result<Vec<String>> {
        insights::repurpose_existing_content(
            &self.db,
            self.analytics.as_ref(),
            self.completions.as_ref(),
            self.today(),
        )
        .await
    }

    /// Fetch (or reuse) the window's data, then ask for trends and for
    /// repurposing ideas.
    ///
    /// `prompt` is accepted for callers but not sent; both completions use
    /// their own fixed prompts.
    pub async fn generate_insights(&self, prompt: &str) -> Result<InsightReport> {
        log::debug!("Generating insights (caller prompt '{prompt}' is not forwarded)");
        self.retrieve_window_data().await?;
        let ideas = self.analyze_trends_and_patterns().await?;
        let reused_content = self.repurpose_existing_content().await?;
        Ok(InsightReport {
            ideas,
            reused_content,
        })
    }

    /// Run [`Self::generate_insights`], logging and alerting on failure
    /// instead of returning the error.
    pub async fn run_guarded(&self, prompt: &str) -> Option<InsightReport> {
        match self.generate_insights(prompt).await {
            Ok(report) => Some(report),
            Err(e) => {
                log::error!("Insight run failed: {e}");
                let failure = FailureContext::new("generate_insights", e.to_string());
                if let Err(alert_err) = self.notifier.notify(&failure).await {
                    log::warn!("Failed to send alert: {alert_err}");
                }
                None
            }
        }
    }

    /// Full run bracketed by timestamped debug log lines.
    pub async fn log_requests_responses(&self, prompt: &str) -> Result<InsightReport> {
        log::debug!("Request made at {}", chrono::Local::now());
        let result = self.generate_insights(prompt).await;
        log::debug!("Response received at {}", chrono::Local::now());
        result
    }

    /// Time one full run. The run's own error, if any, is returned alongside.
    pub async fn monitor_performance(
        &self,
        prompt: &str,
    ) -> (PerformanceReport, Result<InsightReport>) {
        let watch = Stopwatch::start();
        let result = self.generate_insights(prompt).await;
        let report = watch.finish(result.is_ok());
        log::info!("{report}");
        (report, result)
    }

    // ── Utilities ──────────────────────────────────────────────────

    pub async fn record_feedback(&self, feedback: &str) -> Result<()> {
        feedback::record_feedback(&self.db, feedback).await
    }

    pub async fn generate_report(&self, drop_incomplete: bool) -> Result<String> {
        report::generate_report(&self.db, drop_incomplete).await
    }

    /// Run [`Self::generate_insights`] only when the probe reports at most
    /// `threshold` pending items.
    pub async fn balance_load(
        &self,
        probe: &dyn LoadProbe,
        threshold: usize,
    ) -> Result<(LoadDecision, Option<InsightReport>)> {
        let pending = probe.pending_items().await?;
        if !load::should_run(pending, threshold) {
            log::info!("Skipping run: {pending} pending items exceeds threshold {threshold}");
            return Ok((LoadDecision::Skipped { pending }, None));
        }
        let report = self.generate_insights(DEFAULT_PROMPT).await?;
        Ok((LoadDecision::Ran { pending }, Some(report)))
    }
}
