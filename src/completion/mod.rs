//! Chat-completion backends
//!
//! The orchestrator only sees the [`CompletionBackend`] trait. The shipped
//! implementation talks to any OpenAI-compatible `/chat/completions`
//! endpoint (DeepSeek by default). Calls are never retried here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CareerError, Result};
use crate::types::{ChatMessage, CompletionConfig};

/// Failure of a single completion call
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Non-2xx response
    #[error("HTTP {status}")]
    Status { status: u16, body: String },
    /// Connection failure or timeout
    #[error("{0}")]
    Transport(String),
    /// 2xx response without usable content
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// True for failures that happened before any HTTP status was received
    pub fn is_transport(&self) -> bool {
        matches!(self, CompletionError::Transport(_))
    }
}

impl From<CompletionError> for CareerError {
    fn from(e: CompletionError) -> Self {
        CareerError::Completion(e.to_string())
    }
}

/// Request body sent to the completion endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Something that turns a message list into an assistant reply
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send the ordered messages and return the assistant content
    async fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> std::result::Result<String, CompletionError>;

    /// Model identifier
    fn model_name(&self) -> &str;
}

/// Client for OpenAI-compatible chat-completion APIs
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl OpenAiCompatibleClient {
    /// Build a client with the configured request timeout
    pub fn new(config: CompletionConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CareerError::Config("API key is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Request body for `messages`
    pub fn request<'a>(&'a self, messages: &'a [ChatMessage]) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.config.model,
            messages,
            stream: false,
            temperature: self.config.temperature,
        }
    }

    /// One-sentence round trip to check credentials and connectivity
    pub async fn ping(&self) -> Result<String> {
        let probe = [ChatMessage::user("Hello, please reply with one sentence")];
        Ok(self.complete(&probe).await?)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompatibleClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> std::result::Result<String, CompletionError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&self.request(messages))
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("no choices returned".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
