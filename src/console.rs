//! Terminal stand-in for a chat service.
//!
//! Each input line `#channel message` becomes a [`MessageEvent`] from the
//! local user; lines without a `#channel` prefix go to `#general`. Whatever
//! the assistant sends, reacts or uploads is printed to stdout, and every
//! message is kept as channel history.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::chat::{Author, Channel, ChatError, ChatPlatform, Guild, HistoryMessage, MessageEvent};

/// Channel used for lines without a `#channel` prefix.
pub const DEFAULT_CHANNEL: &str = "general";

const ASSISTANT_ID: u64 = 1;
const ASSISTANT_NAME: &str = "pal";

pub struct ConsolePlatform {
    user: Author,
    guild: Guild,
    channels: Mutex<HashMap<String, u64>>,
    history: Mutex<HashMap<u64, Vec<HistoryMessage>>>,
    next_id: AtomicU64,
}

impl ConsolePlatform {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user: Author {
                id: 2,
                name: user_name.into(),
                is_bot: false,
            },
            guild: Guild {
                id: 1,
                name: "console".into(),
            },
            channels: Mutex::new(HashMap::new()),
            history: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(100),
        }
    }

    fn channel(&self, name: &str) -> Channel {
        let mut channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        let next = channels.len() as u64 + 10;
        let id = *channels.entry(name.to_string()).or_insert(next);
        Channel {
            id,
            name: name.to_string(),
        }
    }

    fn remember(&self, channel: &Channel, author: &Author, content: &str) {
        let mut history = self.history.lock().unwrap_or_else(|p| p.into_inner());
        history.entry(channel.id).or_default().push(HistoryMessage {
            author: author.clone(),
            content: content.to_string(),
        });
    }

    fn assistant() -> Author {
        Author {
            id: ASSISTANT_ID,
            name: ASSISTANT_NAME.into(),
            is_bot: true,
        }
    }

    /// Turn one input line into an event. Blank lines yield `None`.
    pub fn parse_line(&self, line: &str) -> Option<MessageEvent> {
        let line = line.trim();
        let (channel, text) = match line.strip_prefix('#') {
            Some(rest) => match rest.split_once(char::is_whitespace) {
                Some((name, text)) => (name, text.trim_start()),
                None => (rest, ""),
            },
            None => (DEFAULT_CHANNEL, line),
        };
        if text.is_empty() {
            return None;
        }

        let channel = self.channel(channel);
        self.remember(&channel, &self.user, text);
        Some(MessageEvent {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            text: text.to_string(),
            channel,
            author: self.user.clone(),
            guild: self.guild.clone(),
        })
    }

    /// Forward parsed lines from `reader` until EOF or the receiver closes.
    pub async fn forward_lines<R>(&self, reader: R, events: mpsc::Sender<MessageEvent>) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let Some(event) = self.parse_line(&line) else {
                continue;
            };
            if events.send(event).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for ConsolePlatform {
    fn self_id(&self) -> u64 {
        ASSISTANT_ID
    }

    async fn send(&self, channel: &Channel, text: &str) -> Result<(), ChatError> {
        println!("[#{}] {ASSISTANT_NAME}: {text}", channel.name);
        self.remember(channel, &Self::assistant(), text);
        Ok(())
    }

    async fn react(&self, message: &MessageEvent, emoji: &str) -> Result<(), ChatError> {
        println!("[#{}] {ASSISTANT_NAME} reacted {emoji}", message.channel.name);
        Ok(())
    }

    async fn upload(&self, channel: &Channel, path: &Path) -> Result<(), ChatError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| ChatError::Upload {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .len();
        println!(
            "[#{}] {ASSISTANT_NAME} uploaded {} ({size} bytes)",
            channel.name,
            path.display()
        );
        Ok(())
    }

    async fn history(&self, channel: &Channel, limit: usize) -> Result<Vec<HistoryMessage>, ChatError> {
        let history = self.history.lock().unwrap_or_else(|p| p.into_inner());
        let messages = history.get(&channel.id).map(Vec::as_slice).unwrap_or_default();
        let skip = messages.len().saturating_sub(limit);
        Ok(messages[skip..].to_vec())
    }
}
