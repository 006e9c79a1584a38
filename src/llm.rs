//! Chat-completions client for an OpenAI-compatible API.
//!
//! Works against the hosted OpenAI endpoint or any local inference server
//! exposing the same `/chat/completions` shape. The answer pipeline treats
//! every failure here as non-fatal and falls through to the next stage.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Request timeout for completion calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_TOKENS: u32 = 2000;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("completion request failed ({status}): {body}")]
    BadStatus { status: u16, body: String },
    #[error("completion response contained no choices")]
    EmptyResponse,
    #[error(transparent)]
    RequestFailed(#[from] anyhow::Error),
}

/// A single message in a conversation, in chat-completions wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build LLM HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Run a chat completion and return the assistant message content.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model,
            messages,
            temperature,
            max_tokens: MAX_TOKENS,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("completion request failed")?;

        let status = resp.status();
        let body = resp.text().await.context("failed to read completion body")?;

        if !status.is_success() {
            return Err(LlmError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = crate::json::parse_json_with_context(&body)?;
        let choice = parsed.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;

        trace!(model, reply_len = choice.message.content.len(), "completion received");
        Ok(choice.message.content)
    }
}
