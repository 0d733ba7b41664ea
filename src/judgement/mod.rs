//! Multi-judge verdict pipeline.
//!
//! A statement is put to a panel of differently-minded LLM "judges" in
//! parallel. When their sentiment agrees the first judge's answer is the
//! verdict; otherwise an arbiter reads every opinion and writes one. Verdicts
//! are cached for an hour by statement fingerprint.
//!
//! * [`Judgement`] — the `judge(statement) -> verdict` entry point.
//! * [`JudgeSelector`] — baseline panel plus keyword-triggered specialists.
//! * [`JudgeExecutor`] — one judge call, and parallel dispatch over many.
//! * [`ConsensusDetector`] / [`SentimentClassifier`] — agreement check.
//! * [`Synthesizer`] — arbiter call over the collected opinions.
//! * [`JudgementCache`] / [`CacheStore`] — TTL cache with pluggable storage.
//! * [`PersonalityRegistry`] — named system prompts.

pub mod cache;
pub mod consensus;
pub mod error;
pub mod executor;
pub mod judge;
pub mod orchestrator;
pub mod personality;
pub mod selector;
pub mod synthesis;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use cache::{
    fingerprint, CacheEntry, CacheStore, Clock, InMemoryStore, JudgementCache, SystemClock,
};
pub use consensus::{ConsensusDetector, KeywordClassifier, Sentiment, SentimentClassifier};
pub use error::JudgementError;
pub use executor::JudgeExecutor;
pub use judge::{Confidence, JudgeConfig, JudgeOutcome, JudgeTemplate};
pub use orchestrator::{Judgement, JudgementStage};
pub use personality::PersonalityRegistry;
pub use selector::JudgeSelector;
pub use synthesis::Synthesizer;
