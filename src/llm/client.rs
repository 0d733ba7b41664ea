//! `OpenAiClient` — calls any OpenAI-compatible `/chat/completions` endpoint.
//!
//! Works with Perplexity, the Akash chat API, OpenAI, vLLM and anything else
//! that speaks the chat-completions wire format. All connection details come
//! from [`BackendConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::BackendConfig;
use crate::llm::completion::{Completion, CompletionApi, CompletionError, CompletionRequest, Usage};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
    /// Perplexity extension; absent elsewhere.
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Build a client from backend settings.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionApi for OpenAiClient {
    /// Send `request` to the configured endpoint.
    ///
    /// The `Authorization: Bearer …` header is attached only when an API key
    /// is configured.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let mut req = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Parse(e.to_string()))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?
            .message;

        let content = message.content.unwrap_or_default();
        let refusal = message.refusal.filter(|r| !r.is_empty());
        if content.trim().is_empty() && refusal.is_none() {
            return Err(CompletionError::EmptyResponse);
        }

        log::debug!(
            "completion from {} ({} tokens)",
            parsed.model,
            parsed.usage.total_tokens
        );

        Ok(Completion {
            content,
            model: parsed.model,
            refusal,
            usage: parsed.usage,
            citations: parsed.citations,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
