use crate::error::{Error, Result};
use crate::storage::repository;
use crate::storage::Database;

pub const ANALYTICS_TOKEN_ENV: &str = "GOOGLE_ANALYTICS_API_KEY";
pub const COMPLETION_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_ANALYTICS_URL: &str = "https://www.googleapis.com/analytics/v3/data/ga";
const DEFAULT_VIEW_ID: &str = "123456789";
const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/completions";
const DEFAULT_LOAD_CHECK_URL: &str = "http://localhost:5000";
const DEFAULT_LOAD_THRESHOLD: usize = 10;

/// Setting keys understood by [`Settings::load`], with their defaults.
pub const SETTING_KEYS: &[(&str, &str)] = &[
    ("analytics_url", DEFAULT_ANALYTICS_URL),
    ("analytics_view_id", DEFAULT_VIEW_ID),
    ("completion_url", DEFAULT_COMPLETION_URL),
    ("completion_model", "(unset)"),
    ("load_check_url", DEFAULT_LOAD_CHECK_URL),
    ("load_threshold", "10"),
];

/// API secrets. Loaded once at startup and handed to the clients that need them.
#[derive(Clone)]
pub struct Credentials {
    pub analytics_token: String,
    pub completion_api_key: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            analytics_token: require_env(ANALYTICS_TOKEN_ENV)?,
            completion_api_key: require_env(COMPLETION_KEY_ENV)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("analytics_token", &"<redacted>")
            .field("completion_api_key", &"<redacted>")
            .finish()
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Config(format!("{name} is not set"))),
    }
}

/// Non-secret settings, stored in `app_config` and editable from the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub analytics_url: String,
    pub analytics_view_id: String,
    pub completion_url: String,
    pub completion_model: Option<String>,
    pub load_check_url: String,
    pub load_threshold: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analytics_url: DEFAULT_ANALYTICS_URL.to_string(),
            analytics_view_id: DEFAULT_VIEW_ID.to_string(),
            completion_url: DEFAULT_COMPLETION_URL.to_string(),
            completion_model: None,
            load_check_url: DEFAULT_LOAD_CHECK_URL.to_string(),
            load_threshold: DEFAULT_LOAD_THRESHOLD,
        }
    }
}

impl Settings {
    /// Read settings from the database, falling back to defaults for unset keys.
    pub async fn load(db: &Database) -> Result<Self> {
        let stored = db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await?;

        let mut settings = Settings::default();
        for (key, value) in stored {
            match key.as_str() {
                "analytics_url" => settings.analytics_url = value,
                "analytics_view_id" => settings.analytics_view_id = value,
                "completion_url" => settings.completion_url = value,
                "completion_model" => {
                    settings.completion_model = Some(value).filter(|v| !v.is_empty())
                }
                "load_check_url" => settings.load_check_url = value,
                "load_threshold" => {
                    settings.load_threshold = value.parse().map_err(|_| {
                        Error::Config(format!("load_threshold must be a number, got '{value}'"))
                    })?
                }
                other => log::debug!("Ignoring unknown config key: {other}"),
            }
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn set(db: &Database, key: &'static str, value: &'static str) {
        db.writer()
            .call(move |conn| repository::set_config(conn, key, value))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let db = Database::open_memory().await.unwrap();
        let s = Settings::load(&db).await.unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.load_threshold, 10);
        assert!(s.completion_model.is_none());
    }

    #[tokio::test]
    async fn test_overrides_from_store() {
        let db = Database::open_memory().await.unwrap();
        set(&db, "analytics_view_id", "42").await;
        set(&db, "completion_model", "gpt-3.5-turbo-instruct").await;
        set(&db, "load_threshold", "3").await;

        let s = Settings::load(&db).await.unwrap();
        assert_eq!(s.analytics_view_id, "42");
        assert_eq!(s.completion_model.as_deref(), Some("gpt-3.5-turbo-instruct"));
        assert_eq!(s.load_threshold, 3);
    }

    #[tokio::test]
    async fn test_bad_threshold_is_config_error() {
        let db = Database::open_memory().await.unwrap();
        set(&db, "load_threshold", "many").await;
        assert!(matches!(Settings::load(&db).await, Err(Error::Config(_))));
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let c = Credentials {
            analytics_token: "ga-secret".into(),
            completion_api_key: "sk-secret".into(),
        };
        let shown = format!("{c:?}");
        assert!(!shown.contains("secret"));
    }
}
