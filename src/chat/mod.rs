//! Chat front end: message routing, conversation replies and the platform seam.
//!
//! * [`Router`] / [`Route`] — classify an incoming message and act on it.
//! * [`ConversationHandler`] — personality + metadata prompt, cleaned reply.
//! * [`ChatPlatform`] — what the assistant needs from a chat service.
//! * [`send_chunked`] — split long text into platform-sized messages.

pub mod context;
pub mod conversation;
pub mod event;
pub mod platform;
pub mod router;

pub use context::{history_block, metadata_header, AI_PLACEHOLDER};
pub use conversation::{ConversationHandler, Reply, ReplyTarget};
pub use event::{Author, Channel, Guild, HistoryMessage, MessageEvent};
pub use platform::{chunk_message, send_chunked, ChatError, ChatPlatform, MAX_MESSAGE_CHARS};
pub use router::{Route, Router};
