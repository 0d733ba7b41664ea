//! Judge configuration and outcome records.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::judgement::error::JudgementError;
use crate::judgement::personality::PersonalityRegistry;

/// Output-token budget for a single judge call.
pub const JUDGE_MAX_TOKENS: u32 = 512;

static CONFIDENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)confidence:\s*(\d{1,2})\s*/\s*10").expect("valid confidence pattern")
});

// ---------------------------------------------------------------------------
// JudgeTemplate / JudgeConfig
// ---------------------------------------------------------------------------

/// Static description of a judge; resolved into a [`JudgeConfig`] at
/// selection time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeTemplate {
    pub name: &'static str,
    pub personality: &'static str,
    pub backend: &'static str,
    pub model: &'static str,
    pub temperature: f32,
}

impl JudgeTemplate {
    pub fn resolve(&self, registry: &PersonalityRegistry) -> Result<JudgeConfig, JudgementError> {
        Ok(JudgeConfig {
            name: self.name.to_string(),
            prompt: registry.prompt(self.personality)?.to_string(),
            backend: self.backend.to_string(),
            model: self.model.to_string(),
            temperature: self.temperature,
            max_tokens: JUDGE_MAX_TOKENS,
        })
    }
}

/// Immutable configuration for one judge call.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeConfig {
    pub name: String,
    /// System-prompt text.
    pub prompt: String,
    /// Backend identifier resolved through the backend registry.
    pub backend: String,
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    pub max_tokens: u32,
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// Confidence a judge reported in its answer.
///
/// `Unparsed` means the judge did not follow the `Confidence: N/10` format.
/// It reports the neutral value 5 where a number is needed but stays
/// distinguishable from a judge that genuinely answered 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Score(u8),
    Unparsed,
}

impl Confidence {
    pub const NEUTRAL: u8 = 5;

    /// Numeric value in 1..=10.
    pub fn value(self) -> u8 {
        match self {
            Confidence::Score(n) => n,
            Confidence::Unparsed => Self::NEUTRAL,
        }
    }

    pub fn is_parsed(self) -> bool {
        matches!(self, Confidence::Score(_))
    }

    /// Extract the first `Confidence: N/10` with N in 1..=10.
    pub fn parse(text: &str) -> Self {
        CONFIDENCE
            .captures_iter(text)
            .filter_map(|caps| caps[1].parse::<u8>().ok())
            .find(|n| (1..=10).contains(n))
            .map_or(Confidence::Unparsed, Confidence::Score)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Score(n) => write!(f, "{n}/10"),
            Confidence::Unparsed => write!(f, "{}/10 (unstated)", Self::NEUTRAL),
        }
    }
}

// ---------------------------------------------------------------------------
// JudgeOutcome
// ---------------------------------------------------------------------------

/// Result of dispatching one judge. Degraded outcomes carry a placeholder
/// message, confidence 1 and `success == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOutcome {
    pub judge: String,
    pub response: String,
    pub confidence: Confidence,
    pub success: bool,
}

impl JudgeOutcome {
    pub fn answered(judge: impl Into<String>, response: impl Into<String>) -> Self {
        let response = response.into();
        Self {
            judge: judge.into(),
            confidence: Confidence::parse(&response),
            response,
            success: true,
        }
    }

    pub fn degraded(judge: impl Into<String>) -> Self {
        let judge = judge.into();
        Self {
            response: format!("Unable to obtain judgement from {judge}."),
            judge,
            confidence: Confidence::Score(1),
            success: false,
        }
    }
}
