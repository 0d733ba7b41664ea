//! Message router — decides what, if anything, the assistant does with an
//! incoming message, then does it.
//!
//! # Routing order (first match wins)
//!
//! ```text
//! own message ─────────────────────────────────────────▶ Ignore
//! #music + "get "/"!get" + video link ─────────────────▶ Music
//! "guidance:" / "!guidance" ───────────────────────────▶ Guidance
//! "online:" / "!online" ───────────────────────────────▶ Online
//! "hey pal" / channel "pal-*" ─────────────────────────▶ Converse
//! anything else ───────────────────────────────────────▶ Ignore
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::judgement::Judgement;
use crate::llm::format_citations;
use crate::media::{contains_video_link, extract_video_url, AudioQuality, MediaFetcher};

use super::context::history_block;
use super::conversation::{ConversationHandler, ReplyTarget};
use super::event::MessageEvent;
use super::platform::{send_chunked, ChatPlatform};

pub const ACK_REACTION: &str = "👍";
pub const MUSIC_REACTION: &str = "🎵";

pub const CONVERT_FAILED: &str =
    "Sorry, I couldn't convert that YouTube video to audio file. It might be too long or unavailable.";
pub const UPLOAD_FAILED: &str = "Sorry, there was an error uploading the audio file.";

const GUIDANCE_PREFIXES: [&str; 2] = ["guidance:", "!guidance"];
const ONLINE_PREFIXES: [&str; 2] = ["online:", "!online"];
const MUSIC_PREFIXES: [&str; 2] = ["get ", "!get"];

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Ignore,
    /// Fetch the audio behind a video link and post it.
    Music { url: String },
    /// Put the statement to the judge panel.
    Guidance { statement: String },
    /// Search-backed reply.
    Online,
    /// Ordinary reply using the channel's settings.
    Converse,
}

impl Route {
    /// Classify `event`. Pure; no platform calls.
    pub fn classify(event: &MessageEvent, self_id: u64, music_channel: &str) -> Self {
        let text = event.text.as_str();

        if event.author.id == self_id {
            return Route::Ignore;
        }

        if event.channel.name == music_channel
            && starts_with_any(text, &MUSIC_PREFIXES)
            && contains_video_link(text)
        {
            if let Some(url) = extract_video_url(text) {
                return Route::Music { url };
            }
        }

        if let Some(rest) = strip_any(text, &GUIDANCE_PREFIXES) {
            let statement = rest.trim_start_matches(':').trim().to_string();
            return Route::Guidance { statement };
        }

        if starts_with_any(text, &ONLINE_PREFIXES) {
            return Route::Online;
        }

        if text.starts_with("hey pal") || event.channel.name.starts_with("pal-") {
            return Route::Converse;
        }

        Route::Ignore
    }
}

fn starts_with_any(text: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| text.starts_with(p))
}

fn strip_any<'a>(text: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| text.strip_prefix(p))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatches classified messages to the judgement, conversation and media
/// services and posts the results back through the platform.
pub struct Router {
    platform: Arc<dyn ChatPlatform>,
    judgement: Arc<Judgement>,
    conversation: Arc<ConversationHandler>,
    media: Arc<dyn MediaFetcher>,
    music_channel: String,
}

impl Router {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        judgement: Arc<Judgement>,
        conversation: Arc<ConversationHandler>,
        media: Arc<dyn MediaFetcher>,
        music_channel: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            judgement,
            conversation,
            media,
            music_channel: music_channel.into(),
        }
    }

    /// Handle events until `events` is closed, each in its own task, then
    /// wait for in-flight handlers to finish.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<MessageEvent>) {
        let mut tasks = JoinSet::new();
        while let Some(event) = events.recv().await {
            let router = Arc::clone(&self);
            tasks.spawn(async move { router.handle(&event).await });
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                log::error!("message handler panicked: {e}");
            }
        }
        log::info!("router: event channel closed, shutting down");
    }

    pub async fn handle(&self, event: &MessageEvent) {
        let route = Route::classify(event, self.platform.self_id(), &self.music_channel);
        log::debug!(
            "#{} {} [{}]: {route:?}",
            event.channel.name,
            event.author.name,
            event.author.id
        );

        match route {
            Route::Ignore => {}
            Route::Music { url } => self.handle_music(event, &url).await,
            Route::Guidance { statement } => self.handle_guidance(event, &statement).await,
            Route::Online => {
                let target = self.conversation.online_target(&event.channel.name);
                self.handle_reply(event, target).await;
            }
            Route::Converse => {
                let target = self.conversation.channel_target(&event.channel.name);
                self.handle_reply(event, target).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    async fn handle_guidance(&self, event: &MessageEvent, statement: &str) {
        self.react(event, ACK_REACTION).await;
        log::info!("awaiting guidance");
        let verdict = self.judgement.judge(statement).await;
        send_chunked(self.platform.as_ref(), &event.channel, &verdict).await;
    }

    async fn handle_reply(&self, event: &MessageEvent, target: ReplyTarget) {
        self.react(event, ACK_REACTION).await;

        let history = if event.has_flag("+history") {
            self.history(event).await
        } else {
            None
        };
        let reply = self
            .conversation
            .reply(&target, event, history.as_deref())
            .await;

        send_chunked(self.platform.as_ref(), &event.channel, &reply.text).await;
        if event.has_flag("+citations") {
            let citations = format_citations(&reply.citations);
            send_chunked(self.platform.as_ref(), &event.channel, &citations).await;
        }
    }

    async fn handle_music(&self, event: &MessageEvent, url: &str) {
        self.react(event, MUSIC_REACTION).await;
        log::info!("processing video link {url}");

        let Some(path) = self.media.fetch_audio(url, AudioQuality::High).await else {
            send_chunked(self.platform.as_ref(), &event.channel, CONVERT_FAILED).await;
            return;
        };

        match self.platform.upload(&event.channel, &path).await {
            Ok(()) => log::info!("uploaded {}", path.display()),
            Err(e) => {
                log::warn!("{e}; retrying at lower quality");
                self.retry_upload(event, url).await;
            }
        }
        self.media.release(&path).await;
    }

    async fn retry_upload(&self, event: &MessageEvent, url: &str) {
        let Some(path) = self.media.fetch_audio(url, AudioQuality::Low).await else {
            send_chunked(self.platform.as_ref(), &event.channel, CONVERT_FAILED).await;
            return;
        };
        match self.platform.upload(&event.channel, &path).await {
            Ok(()) => log::info!("uploaded {} on retry", path.display()),
            Err(e) => {
                log::error!("{e}");
                send_chunked(self.platform.as_ref(), &event.channel, UPLOAD_FAILED).await;
            }
        }
        self.media.release(&path).await;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn react(&self, event: &MessageEvent, emoji: &str) {
        if let Err(e) = self.platform.react(event, emoji).await {
            log::warn!("{e}");
        }
    }

    async fn history(&self, event: &MessageEvent) -> Option<String> {
        let limit = self.conversation.history_limit();
        match self.platform.history(&event.channel, limit).await {
            Ok(messages) => Some(history_block(&messages, self.platform.self_id())),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
