//! Final verdict synthesis by the arbiter judge.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::config::AKASH_BACKEND;
use crate::judgement::error::JudgementError;
use crate::judgement::judge::{JudgeConfig, JudgeOutcome, JudgeTemplate};
use crate::judgement::personality::PersonalityRegistry;
use crate::llm::{BackendRegistry, CompletionError, CompletionRequest};

/// Returned when the arbiter call fails.
pub const SYNTHESIS_FAILED: &str = "Unable to formulate final judgement due to technical issues.";

/// The arbiter: neutral personality on its own model and temperature.
pub const ARBITER: JudgeTemplate = JudgeTemplate {
    name: "arbiter",
    personality: "neutral",
    backend: AKASH_BACKEND,
    model: "Meta-Llama-3-3-70B-Instruct",
    temperature: 0.5,
};

/// Build the single user message handed to the arbiter.
pub fn build_transcript(statement: &str, outcomes: &[JudgeOutcome]) -> String {
    let mut transcript = String::from(
        "# Purpose\nAnalyze the judgement statement and the provided judgements below. \
         Formulate a final judgement.\n",
    );
    let _ = writeln!(transcript, "# Judgement Statement\n{statement}");
    for outcome in outcomes {
        let _ = writeln!(
            transcript,
            "# Judgement Provided by {} (confidence {})\n{}",
            outcome.judge, outcome.confidence, outcome.response
        );
    }
    transcript
}

pub struct Synthesizer {
    backends: Arc<BackendRegistry>,
    arbiter: JudgeConfig,
}

impl Synthesizer {
    pub fn new(backends: Arc<BackendRegistry>, arbiter: JudgeConfig) -> Self {
        Self { backends, arbiter }
    }

    /// Synthesizer using the built-in [`ARBITER`].
    pub fn with_registry(
        backends: Arc<BackendRegistry>,
        registry: &PersonalityRegistry,
    ) -> Result<Self, JudgementError> {
        Ok(Self::new(backends, ARBITER.resolve(registry)?))
    }

    pub fn arbiter(&self) -> &JudgeConfig {
        &self.arbiter
    }

    /// Ask the arbiter for a final verdict. Never fails; returns
    /// [`SYNTHESIS_FAILED`] on any error.
    pub async fn synthesize(&self, statement: &str, outcomes: &[JudgeOutcome]) -> String {
        let transcript = build_transcript(statement, outcomes);
        log::debug!("arbiter transcript:\n{transcript}");

        match self.call(transcript).await {
            Ok(verdict) => verdict,
            Err(e) => {
                log::warn!("final judgement failed: {e}");
                SYNTHESIS_FAILED.to_string()
            }
        }
    }

    async fn call(&self, transcript: String) -> Result<String, CompletionError> {
        let api = self.backends.get(&self.arbiter.backend)?;
        let request =
            CompletionRequest::system_user(&self.arbiter.model, &self.arbiter.prompt, transcript)
                .temperature(self.arbiter.temperature)
                .max_tokens(self.arbiter.max_tokens);
        let completion = api.complete(&request).await?;
        if completion.content.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(completion.content)
    }
}
