//! LLM access layer for the PAL assistant.
//!
//! This module provides:
//! * [`CompletionApi`] — async trait implemented by every completion backend.
//! * [`OpenAiClient`] — OpenAI-compatible REST client (Perplexity, Akash, …).
//! * [`BackendRegistry`] — backend identifier → shared client.
//! * [`strip_think_tags`] / [`format_citations`] — output post-processing.
//! * [`CompletionError`] — error variants for completion calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use pal_assistant::config::AppConfig;
//! use pal_assistant::llm::{BackendRegistry, CompletionRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let backends = BackendRegistry::from_config(&config);
//!
//!     let request = CompletionRequest::system_user("sonar", "Be concise.", "What is Rust?");
//!     let completion = backends.get("openai").unwrap().complete(&request).await.unwrap();
//!     println!("{}", completion.content);
//! }
//! ```

pub mod backends;
pub mod cleanup;
pub mod client;
pub mod completion;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use backends::BackendRegistry;
pub use cleanup::{format_citations, strip_think_tags};
pub use client::OpenAiClient;
pub use completion::{
    ChatMessage, Completion, CompletionApi, CompletionError, CompletionRequest, Role, Usage,
};
