//! Text-Generation Client
//!
//! HTTP client for an OpenAI-compatible chat completions API (Groq by
//! default). Returns the raw completion text; callers must not assume it
//! is valid JSON.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Shortest and longest allowed collaborator timeout
pub const MIN_TIMEOUT_SECS: u64 = 10;
pub const MAX_TIMEOUT_SECS: u64 = 30;

/// A single text-completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Anything that turns a prompt into free-form text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one completion and return the generated text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CollaboratorError>;

    /// Short name for logs and health output
    fn name(&self) -> &str;
}

/// Configuration for the chat completions client
#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    /// Base URL including the API version, e.g. "https://api.groq.com/openai/v1"
    pub base_url: String,
    /// Bearer token; requests are sent unauthenticated when absent
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds (clamped to 10..=30)
    pub timeout_secs: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            timeout_secs: MAX_TIMEOUT_SECS,
        }
    }
}

impl CollaboratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(clamp_timeout_secs(self.timeout_secs))
    }
}

/// Keep a timeout inside the supported 10-30 second range
pub fn clamp_timeout_secs(secs: u64) -> u64 {
    secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)
}

/// Chat completions API client
pub struct ChatCompletionsClient {
    client: Client,
    config: CollaboratorConfig,
}

impl ChatCompletionsClient {
    /// Create a new client with the given configuration
    pub fn new(config: CollaboratorConfig) -> Result<Self, CollaboratorError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &CollaboratorConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CollaboratorError> {
        let body = ChatCompletionRequest {
            model: request.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_instruction.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CollaboratorError::Timeout
            } else if e.is_connect() {
                CollaboratorError::Unavailable
            } else {
                CollaboratorError::Request(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CollaboratorError::EmptyResponse)
    }

    fn name(&self) -> &str {
        &self.config.base_url
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when talking to the text-generation service
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Text-generation service unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Empty completion")]
    EmptyResponse,

    #[error("No JSON object found in completion")]
    NoJson,

    #[error("Invalid JSON in completion: {0}")]
    InvalidJson(String),
}
