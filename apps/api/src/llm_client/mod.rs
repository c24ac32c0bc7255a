/// LLM Client — the single point of entry for completion-service calls.
///
/// No other module talks to the completion API directly. The pipeline depends on the
/// `TextGenerator` trait; `LlmClient` is the OpenAI-compatible implementation.
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod stream;

const MAX_RETRIES: u32 = 3;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_BACKOFF: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("No response within {}s", .after.as_secs())]
    Timeout { after: Duration },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A rendered completion request: system instructions plus user context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub system: String,
    pub user: String,
}

/// Model and sampling settings sent with every completion request.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// One incremental unit of generated text, numbered from zero in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationFragment {
    #[serde(rename = "index")]
    pub sequence: u64,
    pub text: String,
}

/// Finite, non-restartable sequence of fragments. Ends with at most one `Err`.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<GenerationFragment, LlmError>> + Send>>;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Waits for the whole response and returns its text.
    async fn complete_blocking(
        &self,
        prompt: &PromptSpec,
        params: &GenerationParams,
    ) -> Result<String, LlmError>;

    /// Opens a streaming completion. Errors opening the request are returned directly;
    /// errors after that arrive as the last item of the stream.
    async fn complete_streaming(
        &self,
        prompt: &PromptSpec,
        params: &GenerationParams,
    ) -> Result<FragmentStream, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl<'a> ChatCompletionRequest<'a> {
    fn new(prompt: &'a PromptSpec, params: &'a GenerationParams, stream: bool) -> Self {
        Self {
            model: &params.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stream,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if it has any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}

/// Pulls the `error.message` out of an API error body, falling back to the raw body.
pub(crate) fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// OpenAI-compatible chat completions client with retry and deadline handling.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    deadline: Duration,
    retry_backoff: Duration,
}

impl LlmClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        deadline: Duration,
    ) -> Result<Self, LlmError> {
        // Connect timeout only: an overall timeout would cut long streams short.
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            deadline,
            retry_backoff: RETRY_BACKOFF,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Makes a non-streaming call, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(
        &self,
        prompt: &PromptSpec,
        params: &GenerationParams,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let request_body = ChatCompletionRequest::new(prompt, params, false);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1x, 2x, 4x the base delay
                let delay = self.retry_backoff * (1 << (attempt - 1));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(self.completions_url())
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
            }

            let completion: ChatCompletionResponse = response.json().await?;

            if let Some(usage) = &completion.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(completion);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete_blocking(
        &self,
        prompt: &PromptSpec,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let completion = tokio::time::timeout(self.deadline, self.call(prompt, params))
            .await
            .map_err(|_| LlmError::Timeout {
                after: self.deadline,
            })??;

        match completion.text() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(LlmError::EmptyContent),
        }
    }

    async fn complete_streaming(
        &self,
        prompt: &PromptSpec,
        params: &GenerationParams,
    ) -> Result<FragmentStream, LlmError> {
        let request_body = ChatCompletionRequest::new(prompt, params, true);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .header("accept", "text/event-stream")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        debug!("Streaming completion opened (model: {})", params.model);
        Ok(stream::fragment_stream(response))
    }
}
