//! Ordinary channel replies: personality prompt + metadata in, cleaned text
//! and citations out.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::judgement::PersonalityRegistry;
use crate::llm::{strip_think_tags, BackendRegistry, CompletionError, CompletionRequest};

use super::context::metadata_header;
use super::event::MessageEvent;

/// Which backend, model and personality answer a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub backend: String,
    pub model: String,
    pub personality: String,
}

/// Text to post plus any sources the backend returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub citations: Vec<String>,
}

impl Reply {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

pub struct ConversationHandler {
    backends: Arc<BackendRegistry>,
    personalities: Arc<PersonalityRegistry>,
    config: AppConfig,
}

impl ConversationHandler {
    pub fn new(
        config: &AppConfig,
        backends: Arc<BackendRegistry>,
        personalities: Arc<PersonalityRegistry>,
    ) -> Self {
        Self {
            backends,
            personalities,
            config: config.clone(),
        }
    }

    /// Routing for a channel, with unknown channels using the default entry.
    pub fn channel_target(&self, channel: &str) -> ReplyTarget {
        let settings = self.config.channel(channel);
        ReplyTarget {
            model: self.config.channel_model(&settings),
            backend: settings.backend,
            personality: settings.personality,
        }
    }

    /// Search-backed routing for `online:` queries; keeps the channel's
    /// personality.
    pub fn online_target(&self, channel: &str) -> ReplyTarget {
        let conversation = &self.config.conversation;
        ReplyTarget {
            backend: conversation.online_backend.clone(),
            model: conversation.online_model.clone(),
            personality: self.config.channel(channel).personality,
        }
    }

    pub fn history_limit(&self) -> usize {
        self.config.conversation.history_limit
    }

    /// System turn: personality prompt followed by the metadata header.
    /// User turn: the message followed by the optional history block.
    pub fn build_request(
        &self,
        target: &ReplyTarget,
        event: &MessageEvent,
        history: Option<&str>,
    ) -> CompletionRequest {
        let prompt = self.personalities.get(&target.personality).unwrap_or_else(|| {
            log::warn!("unknown personality '{}', sending no prompt", target.personality);
            ""
        });
        let system = format!("{prompt}\n\n{}", metadata_header(event));
        let user = match history {
            Some(block) if !block.is_empty() => format!("{}\n\n{block}", event.text),
            _ => event.text.clone(),
        };

        CompletionRequest::system_user(target.model.as_str(), system, user)
            .temperature(self.config.conversation.temperature)
            .max_tokens(self.config.conversation.max_tokens)
    }

    /// Ask the target model for a reply. Failures are logged and produce an
    /// empty reply, which the caller does not send.
    pub async fn reply(
        &self,
        target: &ReplyTarget,
        event: &MessageEvent,
        history: Option<&str>,
    ) -> Reply {
        match self.try_reply(target, event, history).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("reply via {}/{} failed: {e}", target.backend, target.model);
                Reply::default()
            }
        }
    }

    async fn try_reply(
        &self,
        target: &ReplyTarget,
        event: &MessageEvent,
        history: Option<&str>,
    ) -> Result<Reply, CompletionError> {
        let api = self.backends.get(&target.backend)?;
        let request = self.build_request(target, event, history);
        let completion = api.complete(&request).await?;

        if completion.is_refusal() {
            log::info!(
                "model refused to answer: {}",
                completion.refusal.as_deref().unwrap_or_default()
            );
        }
        log::debug!(
            "reply from {} ({} chars, {} tokens, {} citations)",
            completion.model,
            completion.content.len(),
            completion.usage.total_tokens,
            completion.citations.len()
        );

        let keep_reasoning = event.text.to_lowercase().contains("+reasoning");
        let is_deepseek = completion.model.to_lowercase().contains("deepseek");
        let text = if is_deepseek || !keep_reasoning {
            strip_think_tags(&completion.content)
        } else {
            completion.content
        };

        Ok(Reply {
            text: text.trim().to_string(),
            citations: completion.citations,
        })
    }
}
