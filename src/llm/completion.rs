//! Core `CompletionApi` trait and the request/response types it speaks.
//!
//! Every backend (Perplexity, Akash, any OpenAI-compatible endpoint) is used
//! through this one request/response contract. Failures surface as
//! [`CompletionError`]; callers decide whether to degrade or propagate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CompletionError
// ---------------------------------------------------------------------------

/// Errors that can occur during a completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("completion request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse completion response: {0}")]
    Parse(String),

    /// The response carried no usable text content.
    #[error("completion returned an empty response")]
    EmptyResponse,

    /// No backend is registered under the requested identifier.
    #[error("unknown completion backend: {0}")]
    UnknownBackend(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry of the ordered message list sent to a backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// The common two-message shape: one system prompt, one user turn.
    pub fn system_user(
        model: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A successful completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Generated text (may be empty when the model refused).
    pub content: String,
    /// Model that actually served the request, as reported by the backend.
    pub model: String,
    /// Refusal explanation, when the model declined to answer.
    pub refusal: Option<String>,
    pub usage: Usage,
    /// Source URLs returned by search-backed models.
    pub citations: Vec<String>,
}

impl Completion {
    /// Completion carrying only text; used by test doubles.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn is_refusal(&self) -> bool {
        self.refusal.as_deref().is_some_and(|r| !r.is_empty())
    }
}

// ---------------------------------------------------------------------------
// CompletionApi trait
// ---------------------------------------------------------------------------

/// Async trait for chat-completion backends.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// behind `Arc<dyn CompletionApi>`.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_user_builds_two_messages() {
        let req = CompletionRequest::system_user("m", "sys", "hello")
            .temperature(0.3)
            .max_tokens(512);
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[1].content, "hello");
        assert_eq!(req.max_tokens, 512);
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn request_serializes_lowercase_roles() {
        let req = CompletionRequest::system_user("m", "sys", "hello");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 1024);
    }

    #[test]
    fn refusal_requires_text() {
        let mut c = Completion::text("");
        assert!(!c.is_refusal());
        c.refusal = Some(String::new());
        assert!(!c.is_refusal());
        c.refusal = Some("I can't help with that".into());
        assert!(c.is_refusal());
    }

    #[test]
    fn completion_api_is_object_safe() {
        fn _assert(_: Box<dyn CompletionApi>) {}
    }
}
