//! The `ChatPlatform` seam and outbound message chunking.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use super::event::{Channel, HistoryMessage, MessageEvent};

/// Longest message the platform accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

// ---------------------------------------------------------------------------
// ChatError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to send message: {0}")]
    Send(String),

    #[error("failed to add reaction: {0}")]
    React(String),

    #[error("failed to upload {}: {reason}", path.display())]
    Upload { path: PathBuf, reason: String },

    #[error("failed to read channel history: {0}")]
    History(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// ChatPlatform trait
// ---------------------------------------------------------------------------

/// Operations the assistant needs from a chat service.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// User id of the assistant's own account.
    fn self_id(&self) -> u64;

    async fn send(&self, channel: &Channel, text: &str) -> Result<(), ChatError>;

    async fn react(&self, message: &MessageEvent, emoji: &str) -> Result<(), ChatError>;

    /// Post a file as an attachment.
    async fn upload(&self, channel: &Channel, path: &Path) -> Result<(), ChatError>;

    /// Up to `limit` recent messages, in the order the platform returns them.
    async fn history(&self, channel: &Channel, limit: usize) -> Result<Vec<HistoryMessage>, ChatError>;
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Split `text` into pieces of at most `limit` characters, never inside a
/// UTF-8 sequence.
pub fn chunk_message(text: &str, limit: usize) -> Vec<&str> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == limit {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Send `text` as consecutive chunks. Empty text sends nothing; a failed chunk
/// is logged and the remaining chunks are still sent.
pub async fn send_chunked(platform: &dyn ChatPlatform, channel: &Channel, text: &str) {
    if text.is_empty() {
        return;
    }
    log::debug!("sending {} chars to #{}", text.chars().count(), channel.name);
    for chunk in chunk_message(text, MAX_MESSAGE_CHARS) {
        if let Err(e) = platform.send(channel, chunk).await {
            log::error!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_message("hello", 2000), vec!["hello"]);
        assert!(chunk_message("", 2000).is_empty());
    }

    #[test]
    fn splits_at_exact_limit() {
        let text = "a".repeat(4500);
        let chunks = chunk_message(&text, 2000);
        let lens: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(lens, [2000, 2000, 500]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ก".repeat(5);
        let chunks = chunk_message(&text, 2);
        assert_eq!(chunks, vec!["กก", "กก", "ก"]);
    }

    /// Fails the second send, records the rest.
    struct Flaky {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatPlatform for Flaky {
        fn self_id(&self) -> u64 {
            0
        }

        async fn send(&self, _channel: &Channel, text: &str) -> Result<(), ChatError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(text.to_string());
            if calls.len() == 2 {
                return Err(ChatError::Send("rate limited".into()));
            }
            Ok(())
        }

        async fn react(&self, _message: &MessageEvent, _emoji: &str) -> Result<(), ChatError> {
            Ok(())
        }

        async fn upload(&self, _channel: &Channel, _path: &Path) -> Result<(), ChatError> {
            Ok(())
        }

        async fn history(&self, _channel: &Channel, _limit: usize) -> Result<Vec<HistoryMessage>, ChatError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failed_chunk_does_not_stop_the_rest() {
        let platform = Flaky {
            calls: Mutex::new(Vec::new()),
        };
        let channel = Channel {
            id: 1,
            name: "general".into(),
        };
        let text = "x".repeat(MAX_MESSAGE_CHARS * 2 + 10);

        send_chunked(&platform, &channel, &text).await;
        assert_eq!(platform.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_text_sends_nothing() {
        let platform = Flaky {
            calls: Mutex::new(Vec::new()),
        };
        let channel = Channel {
            id: 1,
            name: "general".into(),
        };
        send_chunked(&platform, &channel, "").await;
        assert!(platform.calls.lock().unwrap().is_empty());
    }
}
