//! Chat-completion transport.

use crate::runtime::{AsyncTask, TaskAborted};
use log::debug;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Failures talking to the completion service. Never escapes the scorer.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    MalformedResponse(String),

    #[error("client setup failed: {0}")]
    ClientSetup(String),

    #[error(transparent)]
    Aborted(#[from] TaskAborted),
}

/// One prompt: an optional system message and the user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
    /// Ask the service to constrain output to a JSON object.
    pub json_mode: bool,
}

/// Anything that can turn a prompt into completion text.
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, prompt: &Prompt) -> AsyncTask<Result<String, LlmError>>;
}

impl<B: CompletionBackend + ?Sized> CompletionBackend for Arc<B> {
    fn complete(&self, prompt: &Prompt) -> AsyncTask<Result<String, LlmError>> {
        (**self).complete(prompt)
    }
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(60);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::ClientSetup(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        })
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CompletionBackend for OpenAiBackend {
    fn complete(&self, prompt: &Prompt) -> AsyncTask<Result<String, LlmError>> {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let url = format!("{}/chat/completions", self.base_url);
        let timeout = self.timeout;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &prompt.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt.user}));
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if prompt.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        AsyncTask::spawn_async(async move {
            let send = client
                .post(&url)
                .bearer_auth(api_key)
                .json(&body)
                .send();
            let response = tokio::time::timeout(timeout, send)
                .await
                .map_err(|_| LlmError::Timeout(timeout))?
                .map_err(|e| LlmError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(LlmError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let json: Value = response
                .json()
                .await
                .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
            debug!("Completion usage: {}", json["usage"]);

            json["choices"][0]["message"]["content"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| LlmError::MalformedResponse("missing choices[0].message.content".into()))
        })
    }
}
