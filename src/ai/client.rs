//! Chat Completions Client
//!
//! Text-generation client for OpenAI-compatible chat endpoints. Returns raw
//! message content plus token usage so the caller can account the call even
//! when the content later fails to parse.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::timeout::request_timeout;
use crate::config::Config;
use crate::constants::{diagnostics, limits};
use crate::types::error::excerpt;
use crate::types::{AutopressError, Result};

/// Chat client with secure API key handling
pub struct ChatClient {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Parameters for one completion call, fully resolved by the caller.
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Raw completion result: content still unparsed, usage already extracted.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(AutopressError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
            .build()
            .map_err(|e| AutopressError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: config.api.api_base.clone(),
            client,
        })
    }

    /// Issue one chat completion.
    ///
    /// The request timeout scales with the token budget; temperature is
    /// clamped to the range the endpoint accepts.
    pub async fn complete(&self, params: ChatParams) -> Result<ChatCompletion> {
        let request = ChatCompletionRequest {
            model: params.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: params.system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: params.user,
                },
            ],
            max_tokens: params.max_tokens,
            temperature: clamp_temperature(params.temperature),
        };

        let url = format!("{}/chat/completions", self.api_base);
        let timeout = request_timeout(params.max_tokens);

        debug!(
            model = %params.model,
            max_tokens = params.max_tokens,
            timeout_secs = timeout.as_secs(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| AutopressError::Http(format!("chat request failed: {e}")))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| AutopressError::Http(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let detail = api_error_message(&raw)
                .map(|msg| excerpt(&msg, diagnostics::TEXT_BODY_EXCERPT_CHARS))
                .unwrap_or_else(|| excerpt(&raw, diagnostics::TEXT_BODY_EXCERPT_CHARS));
            return Err(AutopressError::Api {
                status: status.as_u16(),
                body: detail,
            });
        }

        let body: ChatCompletionResponse = serde_json::from_str(&raw).map_err(|_| {
            AutopressError::InvalidResponse(format!(
                "undecodable completion body: {}",
                excerpt(&raw, diagnostics::TEXT_BODY_EXCERPT_CHARS)
            ))
        })?;

        if let Some(error) = body.error {
            return Err(AutopressError::OpenAi(excerpt(
                &error.message,
                diagnostics::TEXT_BODY_EXCERPT_CHARS,
            )));
        }

        let content = body
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                AutopressError::InvalidResponse("no content in completion response".to_string())
            })?
            .to_string();

        let usage = body.usage.unwrap_or_default();
        let model = body.model.unwrap_or(params.model);

        info!(
            model = %model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Chat completion succeeded"
        );

        Ok(ChatCompletion {
            content,
            model,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }
}

/// Clamp temperature to the range the chat endpoint accepts.
fn clamp_temperature(temperature: f32) -> f32 {
    temperature.clamp(limits::MIN_TEMPERATURE, limits::MAX_TEMPERATURE)
}

/// API-supplied error message from a raw body, when decodable.
fn api_error_message(raw: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorEnvelope>(raw)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
    model: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UsageInfo {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}
