/// LLM Client: the single point of entry for all Claude API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all scoring calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-3-5-sonnet-20241022";
const MAX_TOKENS: u32 = 2000;
const MAX_RETRIES: u32 = 3;
/// Deadline for a single scoring request. Overruns surface as an `LlmError`
/// for the document being scored, never as a batch-wide fault.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("gave up after {retries} attempts")]
    RetriesExhausted { retries: u32 },

    #[error("model returned no text content")]
    EmptyContent,
}

/// The scoring seam consumed by the match analyzer.
///
/// `score` submits one prompt and returns the model's raw text output.
/// Implemented by [`LlmClient`] in production and by in-memory doubles in
/// tests.
#[async_trait]
pub trait ScoringModel: Send + Sync {
    async fn score(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
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

/// Client for the Anthropic Messages API with a bounded per-request deadline
/// and backoff retries on 429/5xx responses.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Makes a call to the Claude API, returning the full response object.
    /// Retries transport errors, 429 and 5xx with exponential backoff; other
    /// API errors (invalid key, malformed request) fail immediately.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&request_body).await {
                Ok(response) => {
                    debug!(
                        "LLM call succeeded: input_tokens={}, output_tokens={}",
                        response.usage.input_tokens, response.usage.output_tokens
                    );
                    return Ok(response);
                }
                Err(err) if is_retryable(&err) => last_error = Some(err),
                Err(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or(LlmError::RetriesExhausted {
            retries: MAX_RETRIES,
        }))
    }

    async fn send_once(&self, body: &AnthropicRequest<'_>) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

fn is_retryable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(_) => true,
        LlmError::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl ScoringModel for LlmClient {
    async fn score(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_block(text: &str) -> ContentBlock {
        ContentBlock {
            block_type: "text".to_string(),
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn test_text_returns_first_text_block() {
        let response = LlmResponse {
            content: vec![
                ContentBlock {
                    block_type: "thinking".to_string(),
                    text: None,
                },
                text_block("first"),
                text_block("second"),
            ],
            usage: Usage {
                input_tokens: 1,
                output_tokens: 1,
            },
        };
        assert_eq!(response.text(), Some("first"));
    }

    #[test]
    fn test_text_returns_none_without_text_blocks() {
        let response = LlmResponse {
            content: vec![],
            usage: Usage {
                input_tokens: 0,
                output_tokens: 0,
            },
        };
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_api_error_body_deserializes() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens required"}}"#;
        let parsed: AnthropicError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "max_tokens required");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(is_retryable(&LlmError::Api {
            status: 429,
            message: String::new()
        }));
        assert!(is_retryable(&LlmError::Api {
            status: 529,
            message: String::new()
        }));
        assert!(!is_retryable(&LlmError::Api {
            status: 401,
            message: String::new()
        }));
        assert!(!is_retryable(&LlmError::EmptyContent));
    }
}
