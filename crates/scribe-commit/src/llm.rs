use std::time::Duration;

use reqwest::StatusCode;
use scribe_core::{LlmConfig, ScribeError};
use serde::Serialize;

/// Sent as `X-Title` so the provider can attribute requests.
const APP_TITLE: &str = "scribe";
const APP_REFERER: &str = "scribe-cli";

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use scribe_commit::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Summarize this diff");
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use scribe_commit::llm::Role;
///
/// assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The prompt is always sent as a single user turn.
    User,
}

/// OpenRouter-compatible chat completions client.
///
/// Any provider exposing `/v1/chat/completions` works; point
/// [`LlmConfig::base_url`] at it. Requests are never retried.
///
/// # Examples
///
/// ```
/// use scribe_core::LlmConfig;
/// use scribe_commit::llm::LlmClient;
///
/// let config = LlmConfig {
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.model(), "openai/gpt-4o-mini");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a client whose requests time out after
    /// [`LlmConfig::timeout_seconds`].
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, ScribeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ScribeError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Endpoint the client posts to.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Send a chat completion request and return the trimmed reply.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Timeout`] when the request times out and
    /// [`ScribeError::Llm`] for transport failures, non-2xx statuses,
    /// provider errors in the body, or an empty reply.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ScribeError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_output_tokens,
        });

        let mut request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", APP_TITLE);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ScribeError::Timeout(self.config.timeout_seconds)
            } else {
                ScribeError::Llm(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body_text));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ScribeError::Llm(format!("failed to parse response: {e}")))?;

        extract_content(&response_body)
    }
}

/// Map a non-2xx status to an error message.
fn status_error(status: StatusCode, body: &str) -> ScribeError {
    let code = status.as_u16();
    let message = match status {
        StatusCode::UNAUTHORIZED => format!("API authentication error (code {code}): {body}"),
        StatusCode::TOO_MANY_REQUESTS => format!("API rate limit exceeded (code {code}): {body}"),
        s if s.is_server_error() => format!("API server error (code {code}): {body}"),
        _ => format!("API error (code {code}): {body}"),
    };
    ScribeError::Llm(message)
}

/// Pull the first choice's content out of a chat completions response.
fn extract_content(body: &serde_json::Value) -> Result<String, ScribeError> {
    if let Some(message) = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
    {
        return Err(ScribeError::Llm(format!("API error: {message}")));
    }

    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ScribeError::Llm("LLM returned empty response".into()))
}
