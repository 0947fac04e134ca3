use chrono::NaiveDate;

use super::{CompletionClient, CompletionRequest};
use crate::analytics::{retrieve_window_data, AnalyticsSource};
use crate::error::Result;
use crate::storage::Database;

pub const TRENDS_PROMPT: &str =
    "Based on the social media data from the past 30 days, what are some trends and patterns?";
pub const REPURPOSE_PROMPT: &str = "Based on the social media data from the past 30 days, what are some ways to repurpose existing content?";

/// Split a completion into suggestions: outer whitespace trimmed, one entry
/// per line. Interior blank lines come through as empty entries.
pub fn parse_suggestions(text: &str) -> Vec<String> {
    text.trim().split('\n').map(str::to_string).collect()
}

/// Ask for trends and patterns in the current window's data.
pub async fn analyze_trends_and_patterns(
    db: &Database,
    analytics: &dyn AnalyticsSource,
    completions: &dyn CompletionClient,
    today: NaiveDate,
) -> Result<Vec<String>> {
    suggest(db, analytics, completions, today, TRENDS_PROMPT).await
}

/// Ask for ways to reuse existing content.
pub async fn repurpose_existing_content(
    db: &Database,
    analytics: &dyn AnalyticsSource,
    completions: &dyn CompletionClient,
    today: NaiveDate,
) -> Result<Vec<String>> {
    suggest(db, analytics, completions, today, REPURPOSE_PROMPT).await
}

async fn suggest(
    db: &Database,
    analytics: &dyn AnalyticsSource,
    completions: &dyn CompletionClient,
    today: NaiveDate,
    prompt: &str,
) -> Result<Vec<String>> {
    // The rows only need to exist; the prompt does not include them.
    let _rows = retrieve_window_data(db, analytics, today).await?;

    let text = completions.complete(&CompletionRequest::new(prompt)).await?;
    let suggestions = parse_suggestions(&text);
    log::debug!("Parsed {} suggestions", suggestions.len());
    Ok(suggestions)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analytics::cache::tests::FakeAnalytics;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Completion client returning a canned reply and recording prompts.
    pub(crate) struct FakeCompletions {
        pub reply: Option<String>,
        pub prompts: Arc<Mutex<Vec<String>>>,
        pub calls: Arc<AtomicUsize>,
    }

    impl FakeCompletions {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                prompts: Arc::new(Mutex::new(Vec::new())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                reply: None,
                prompts: Arc::new(Mutex::new(Vec::new())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletions {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.reply.clone().ok_or_else(|| Error::RemoteApi {
                service: "completion",
                status: Some(500),
                message: "boom".into(),
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_parse_suggestions_trims_then_splits() {
        assert_eq!(parse_suggestions(" Idea A\nIdea B\n"), vec!["Idea A", "Idea B"]);
    }

    #[test]
    fn test_parse_suggestions_keeps_interior_blank_lines() {
        assert_eq!(parse_suggestions("a\n\nb"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_parse_suggestions_empty_text() {
        assert_eq!(parse_suggestions("  \n "), vec![""]);
    }

    #[tokio::test]
    async fn test_trends_uses_fixed_prompt() {
        let db = Database::open_memory().await.unwrap();
        let analytics = FakeAnalytics::new();
        let completions = FakeCompletions::replying(" Idea A\nIdea B\n");

        let ideas = analyze_trends_and_patterns(&db, &analytics, &completions, today())
            .await
            .unwrap();

        assert_eq!(ideas, vec!["Idea A", "Idea B"]);
        assert_eq!(*completions.prompts.lock().unwrap(), vec![TRENDS_PROMPT.to_string()]);
        assert_eq!(analytics.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repurpose_reuses_cached_window() {
        let db = Database::open_memory().await.unwrap();
        let analytics = FakeAnalytics::new();
        let completions = FakeCompletions::replying("Turn threads into carousels");

        analyze_trends_and_patterns(&db, &analytics, &completions, today()).await.unwrap();
        let reused = repurpose_existing_content(&db, &analytics, &completions, today())
            .await
            .unwrap();

        assert_eq!(reused, vec!["Turn threads into carousels"]);
        assert_eq!(completions.prompts.lock().unwrap()[1], REPURPOSE_PROMPT);
        assert_eq!(analytics.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let db = Database::open_memory().await.unwrap();
        let analytics = FakeAnalytics::new();
        let completions = FakeCompletions::failing();

        let err = analyze_trends_and_patterns(&db, &analytics, &completions, today())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RemoteApi { status: Some(500), .. }));
    }
}
