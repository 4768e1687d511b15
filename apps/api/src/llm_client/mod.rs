/// LLM Client: the single point of entry for all Claude API calls.
///
/// No other module may call the Anthropic API directly; the report generator
/// goes through this client.
///
/// Model is hardcoded to keep report output stable across deployments.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for report generation.
pub const MODEL: &str = "claude-opus-4-20250514";
const MAX_TOKENS: u32 = 8000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API.
///
/// `max_attempts` of 1 sends each request exactly once. Higher values retry
/// 429, 5xx and transport failures with exponential backoff.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    max_attempts: u32,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        http_timeout: Duration,
        max_attempts: u32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(http_timeout).build()?,
            api_key,
            max_attempts: max_attempts.max(1),
        })
    }

    /// Sends `prompt` as a single user message and returns the full response.
    pub async fn call(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut attempt = 1;
        loop {
            match self.send(&request_body).await {
                Ok(llm_response) => {
                    debug!(
                        "LLM call succeeded: input_tokens={}, output_tokens={}",
                        llm_response.usage.input_tokens, llm_response.usage.output_tokens
                    );
                    return Ok(llm_response);
                }
                Err(e) if attempt < self.max_attempts && is_retryable(&e) => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(6)));
                    warn!(
                        "LLM call attempt {} failed ({e}), retrying after {}ms...",
                        attempt,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, request_body: &AnthropicRequest<'_>) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        Ok(response.json().await?)
    }

    /// Calls the LLM and returns the text of the first text block.
    pub async fn call_text(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;
        response
            .text()
            .map(str::to_owned)
            .ok_or(LlmError::EmptyContent)
    }
}

/// 429, 5xx and transport failures are worth another attempt; a response
/// body that fails to decode is not.
fn is_retryable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(e) => !e.is_decode(),
        LlmError::Api { status, .. } => *status == 429 || (500..600).contains(status),
        LlmError::EmptyContent => false,
    }
}

/// Pulls the human-readable message out of an Anthropic error body, falling
/// back to the raw body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<AnthropicError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
