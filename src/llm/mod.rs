pub mod insights;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Error, Result};

/// Body of a text-completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub n: u32,
    pub stop: String,
}

impl CompletionRequest {
    /// A request with the fixed sampling parameters used for insights.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            prompt: prompt.into(),
            temperature: 0.5,
            max_tokens: 50,
            n: 1,
            stop: ".".to_string(),
        }
    }
}

/// Text-completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `request` and return the text of the first choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Client for an OpenAI-style `/v1/completions` endpoint.
pub struct OpenAiCompletions {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: Option<String>,
}

impl OpenAiCompletions {
    pub fn new(url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
            model: None,
        }
    }

    /// Model sent with every request that doesn't name its own.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletions {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut body = request.clone();
        if body.model.is_none() {
            body.model = self.model.clone();
        }

        log::debug!("POST completion ({} prompt chars)", body.prompt.len());
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::RemoteApi {
                service: "completion",
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::malformed("completion", format!("invalid JSON body: {e}")))?;
        first_choice_text(&json)
    }
}

/// Extract `choices[0].text` from a completion response body.
pub fn first_choice_text(body: &serde_json::Value) -> Result<String> {
    body.pointer("/choices/0/text")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::malformed("completion", "response has no choices[0].text"))
}
