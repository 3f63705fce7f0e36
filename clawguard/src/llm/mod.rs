//! Remote LLM access for the triage-and-review cascade.
//!
//! The core never talks to a provider directly: it goes through the
//! `LlmClient` capability so tests can script replies and embedders can swap
//! providers. The production implementation targets the Anthropic Messages
//! API over blocking HTTP with a per-call timeout.

pub mod review;
pub mod triage;

use std::time::Duration;

use thiserror::Error;
use tracing::{Level, debug, instrument};

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One bounded chat-completion call.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Errors from a remote completion call. Every variant collapses into the
/// conservative per-stage outcome; none escapes `decide`.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("malformed provider reply: {0}")]
    Shape(String),
}

impl LlmError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout(_))
    }
}

/// Capability for one synchronous, bounded completion call.
pub trait LlmClient {
    fn complete(&self, request: &ChatRequest<'_>) -> Result<String, LlmError>;
}

/// Production client for the Anthropic Messages API.
pub struct AnthropicClient {
    api_key: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl LlmClient for AnthropicClient {
    #[instrument(level = Level::TRACE, skip(self, request), fields(model = request.model))]
    fn complete(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(request.timeout)
            .build();

        let body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": [{"role": "user", "content": request.user}],
        });

        let response = agent
            .post(ANTHROPIC_MESSAGES_URL)
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", ANTHROPIC_VERSION)
            .set("content-type", "application/json")
            .send_json(body);

        let response = match response {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(LlmError::Status { code, body });
            }
            Err(ureq::Error::Transport(transport)) => {
                let message = transport.to_string();
                // ureq surfaces socket timeouts as transport-level IO errors.
                if message.contains("timed out") || message.contains("timeout") {
                    return Err(LlmError::Timeout(request.timeout));
                }
                return Err(LlmError::Transport(message));
            }
        };

        let json: serde_json::Value = response
            .into_json()
            .map_err(|e| LlmError::Shape(format!("response body is not JSON: {e}")))?;

        let text = json["content"][0]["text"]
            .as_str()
            .ok_or_else(|| LlmError::Shape("no text content block in reply".into()))?;

        debug!(chars = text.len(), "LLM reply received");
        Ok(text.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = LlmError::Status {
            code: 429,
            body: "rate limited".into(),
        };
        assert!(e.to_string().contains("429"));
        assert!(!e.is_timeout());

        let t = LlmError::Timeout(Duration::from_secs(30));
        assert!(t.is_timeout());
    }
}
