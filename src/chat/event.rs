//! Platform-neutral view of an incoming chat message.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    pub name: String,
    /// Set for automated accounts (other bots, webhooks).
    pub is_bot: bool,
}

/// The server ("guild") a channel belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: u64,
    pub name: String,
}

/// A message delivered by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub id: u64,
    pub text: String,
    pub channel: Channel,
    pub author: Author,
    pub guild: Guild,
}

impl MessageEvent {
    /// `true` when the message carries the given `+flag` (case-sensitive).
    pub fn has_flag(&self, flag: &str) -> bool {
        self.text.contains(flag)
    }
}

/// One earlier message from a channel's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub author: Author,
    pub content: String,
}
