//! LLM Provider - chat-completion backends
//!
//! `OpenAiProvider` speaks the OpenAI chat completions protocol and works
//! with any compatible server through a custom base URL. `NoOpProvider` is
//! used when no API key is configured so the rest of the service can start.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// One message of a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A chat completion request, independent of the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Metadata about an LLM provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderMetadata {
    /// Display name (e.g. "OpenAI")
    pub name: String,
    pub model: String,
    /// Base URL requests are sent to, if any
    pub endpoint: Option<String>,
}

/// Chat completion backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends the conversation and returns the assistant's reply text
    async fn complete(&self, request: ChatRequest) -> Result<String>;

    fn metadata(&self) -> ProviderMetadata;

    /// Returns true if the provider is configured to serve requests
    fn is_available(&self) -> bool;
}

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    /// `https://api.openai.com/v1` when unset
    pub base_url: Option<String>,
    pub timeout: Duration,
}

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ProviderUnavailable(format!("HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key: config.api_key,
            model: config.model,
            base_url,
            client,
        })
    }

    /// Full URL of the chat completions endpoint
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }

    fn is_default_endpoint(&self) -> bool {
        self.base_url.trim_end_matches('/') == DEFAULT_BASE_URL
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    #[tracing::instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(LlmError::Authentication("Invalid LLM API key".to_string()));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(LlmError::RateLimited("Rate limit exceeded".to_string()));
            }
            status if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::InvalidResponse(format!("Status {}: {}", status, text)));
            }
            _ => {}
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No completion choices returned".to_string()))
    }

    fn metadata(&self) -> ProviderMetadata {
        let name = if self.is_default_endpoint() {
            "OpenAI"
        } else {
            "OpenAI-compatible"
        };
        ProviderMetadata {
            name: name.to_string(),
            model: self.model.clone(),
            endpoint: Some(self.base_url.clone()),
        }
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// A provider that refuses every request, used when no API key is configured
pub struct NoOpProvider;

#[async_trait]
impl LlmProvider for NoOpProvider {
    async fn complete(&self, _request: ChatRequest) -> Result<String> {
        Err(LlmError::ProviderUnavailable(
            "no LLM API key configured".to_string(),
        ))
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "None".to_string(),
            model: "N/A".to_string(),
            endpoint: None,
        }
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests;
