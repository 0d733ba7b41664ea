//! Errors raised outside per-judge isolation.
//!
//! Individual judge failures never appear here; they become degraded
//! outcomes. These variants describe failures of the dispatch step itself,
//! which the orchestrator answers with its single-judge fallback.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JudgementError {
    /// A judge template names a personality the registry does not know.
    #[error("unknown personality: {0}")]
    UnknownPersonality(String),

    /// A dispatched judge task could not be joined (panicked or was aborted).
    #[error("judge dispatch failed: {0}")]
    Dispatch(String),
}

impl From<tokio::task::JoinError> for JudgementError {
    fn from(e: tokio::task::JoinError) -> Self {
        JudgementError::Dispatch(e.to_string())
    }
}
