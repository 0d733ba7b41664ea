//! Judgement orchestrator — `judge(statement) -> verdict`.
//!
//! # Flow
//!
//! ```text
//! CacheCheck ──hit──────────────────────────────────────────────▶ Return
//!     │ miss
//!     ├─ empty statement ───────────────────────────────────────▶ Return
//!     ▼
//! SelectJudges ─▶ Dispatch ──error──▶ Fallback (neutral judge) ─▶ Return
//!                    │ 0 outcomes ──────────────────────────────▶ Return
//!                    ▼
//!              ConsensusCheck ──agree──▶ ShortCircuit ─┐
//!                    │ disagree                         │
//!                    ▼                                  ▼
//!                Synthesize ─────────────────────▶ CacheWrite ─▶ Return
//! ```
//!
//! Only verdicts that went through consensus or synthesis are cached.
//! Concurrent requests for the same statement both compute and both write;
//! the later write wins.

use std::sync::Arc;
use std::time::Duration;

use crate::config::JudgementConfig;
use crate::judgement::cache::{
    fingerprint, normalize, Clock, InMemoryStore, JudgementCache, SystemClock,
};
use crate::judgement::consensus::{ConsensusDetector, SentimentClassifier};
use crate::judgement::error::JudgementError;
use crate::judgement::executor::JudgeExecutor;
use crate::judgement::judge::{JudgeConfig, JudgeOutcome};
use crate::judgement::personality::PersonalityRegistry;
use crate::judgement::selector::JudgeSelector;
use crate::judgement::synthesis::{Synthesizer, ARBITER, SYNTHESIS_FAILED};
use crate::llm::{BackendRegistry, CompletionRequest};

pub const NO_STATEMENT: &str = "No judgement statement provided.";
pub const INSUFFICIENT_JUDGEMENTS: &str = "Insufficient judgements to reach a verdict.";
pub const UNAVAILABLE: &str = "Judgement service is temporarily unavailable.";

// ---------------------------------------------------------------------------
// JudgementStage
// ---------------------------------------------------------------------------

/// States of the judgement state machine, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgementStage {
    CacheCheck,
    SelectJudges,
    Dispatch,
    ConsensusCheck,
    ShortCircuit,
    Synthesize,
    CacheWrite,
    Fallback,
}

impl JudgementStage {
    pub fn label(&self) -> &'static str {
        match self {
            JudgementStage::CacheCheck => "cache-check",
            JudgementStage::SelectJudges => "select-judges",
            JudgementStage::Dispatch => "dispatch",
            JudgementStage::ConsensusCheck => "consensus-check",
            JudgementStage::ShortCircuit => "short-circuit",
            JudgementStage::Synthesize => "synthesize",
            JudgementStage::CacheWrite => "cache-write",
            JudgementStage::Fallback => "fallback",
        }
    }
}

// ---------------------------------------------------------------------------
// Judgement
// ---------------------------------------------------------------------------

/// Multi-judge verdict service.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use pal_assistant::config::AppConfig;
/// use pal_assistant::judgement::Judgement;
/// use pal_assistant::llm::BackendRegistry;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let backends = Arc::new(BackendRegistry::from_config(&config));
/// let judgement = Judgement::from_config(&config, backends);
///
/// let verdict = judgement.judge("Should this law be repealed?").await;
/// println!("{verdict}");
/// # }
/// ```
pub struct Judgement {
    selector: JudgeSelector,
    executor: JudgeExecutor,
    detector: ConsensusDetector,
    synthesizer: Option<Synthesizer>,
    fallback: Option<JudgeConfig>,
    backends: Arc<BackendRegistry>,
    cache: JudgementCache,
    clock: Arc<dyn Clock>,
}

impl Judgement {
    /// Build a service over `registry` with an in-memory cache, the keyword
    /// sentiment classifier and the wall clock.
    pub fn new(
        registry: PersonalityRegistry,
        backends: Arc<BackendRegistry>,
        config: &JudgementConfig,
    ) -> Self {
        // Arbiter and fallback both use the neutral personality; if it is
        // missing they degrade to their fixed messages.
        let arbiter = match ARBITER.resolve(&registry) {
            Ok(mut judge) => {
                judge.max_tokens = config.max_tokens;
                Some(judge)
            }
            Err(e) => {
                log::warn!("arbiter unavailable: {e}");
                None
            }
        };
        let synthesizer = arbiter
            .clone()
            .map(|judge| Synthesizer::new(Arc::clone(&backends), judge));
        let fallback = arbiter.map(|mut judge| {
            judge.name = "fallback".into();
            judge
        });

        Self {
            selector: JudgeSelector::new(registry),
            executor: JudgeExecutor::new(Arc::clone(&backends)),
            detector: ConsensusDetector::with_threshold(config.consensus_threshold),
            synthesizer,
            fallback,
            backends,
            cache: JudgementCache::new(
                Arc::new(InMemoryStore::new()),
                Duration::from_secs(config.cache_ttl_secs),
            ),
            clock: Arc::new(SystemClock),
        }
    }

    /// Service configured from the application settings, including any
    /// config-supplied personalities.
    pub fn from_config(config: &crate::config::AppConfig, backends: Arc<BackendRegistry>) -> Self {
        Self::new(
            PersonalityRegistry::with_overrides(&config.personalities),
            backends,
            &config.judgement,
        )
    }

    pub fn with_cache(mut self, cache: JudgementCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn SentimentClassifier>) -> Self {
        let threshold = self.detector.threshold();
        self.detector = ConsensusDetector::new(classifier, threshold);
        self
    }

    /// Produce a verdict for `statement`. Never fails.
    pub async fn judge(&self, statement: &str) -> String {
        let statement = normalize(statement);

        enter(JudgementStage::CacheCheck);
        let key = fingerprint(statement);
        if let Some(verdict) = self.cache.lookup(&key, self.clock.now()) {
            log::info!("judgement cache hit for {}", &key[..12]);
            return verdict;
        }

        if statement.is_empty() {
            return NO_STATEMENT.to_string();
        }

        let outcomes = match self.gather(statement).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                log::warn!("judge dispatch failed ({e}); using single-judge fallback");
                return self.fallback(statement).await;
            }
        };

        if outcomes.is_empty() {
            return INSUFFICIENT_JUDGEMENTS.to_string();
        }

        enter(JudgementStage::ConsensusCheck);
        let verdict = if self.detector.has_consensus(&outcomes) {
            enter(JudgementStage::ShortCircuit);
            outcomes[0].response.clone()
        } else {
            enter(JudgementStage::Synthesize);
            match &self.synthesizer {
                Some(synthesizer) => synthesizer.synthesize(statement, &outcomes).await,
                None => SYNTHESIS_FAILED.to_string(),
            }
        };

        enter(JudgementStage::CacheWrite);
        self.cache.insert(&key, verdict.clone(), self.clock.now());
        verdict
    }

    /// Selection plus parallel dispatch; any error here is dispatch-level.
    async fn gather(&self, statement: &str) -> Result<Vec<JudgeOutcome>, JudgementError> {
        enter(JudgementStage::SelectJudges);
        let judges = self.selector.select(statement)?;
        log::info!(
            "consulting {} judges: {}",
            judges.len(),
            judges
                .iter()
                .map(|j| j.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        enter(JudgementStage::Dispatch);
        self.executor.dispatch(judges, statement).await
    }

    /// Ask the neutral judge directly. Last line of defense: never fails and
    /// its result is never cached.
    async fn fallback(&self, statement: &str) -> String {
        enter(JudgementStage::Fallback);
        let Some(judge) = &self.fallback else {
            return UNAVAILABLE.to_string();
        };
        let Ok(api) = self.backends.get(&judge.backend) else {
            return UNAVAILABLE.to_string();
        };

        let request = CompletionRequest::system_user(&judge.model, &judge.prompt, statement)
            .temperature(judge.temperature)
            .max_tokens(judge.max_tokens);
        match api.complete(&request).await {
            Ok(completion) if !completion.content.trim().is_empty() => completion.content,
            Ok(_) => UNAVAILABLE.to_string(),
            Err(e) => {
                log::warn!("fallback judge failed: {e}");
                UNAVAILABLE.to_string()
            }
        }
    }
}

fn enter(stage: JudgementStage) {
    log::debug!("judgement: {}", stage.label());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AKASH_BACKEND;
    use crate::llm::{Completion, CompletionApi, CompletionError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    /// Answers by model name; counts calls.
    struct Scripted {
        answers: Vec<(&'static str, &'static str)>,
        default: &'static str,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(answers: Vec<(&'static str, &'static str)>, default: &'static str) -> Self {
            Self {
                answers,
                default,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionApi for Scripted {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = self
                .answers
                .iter()
                .find(|(model, _)| *model == request.model)
                .map_or(self.default, |(_, a)| *a);
            if answer.is_empty() {
                Err(CompletionError::Timeout)
            } else {
                Ok(Completion::text(answer))
            }
        }
    }

    struct ManualClock(AtomicU64);

    impl Clock for ManualClock {
        fn now(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn service(api: Arc<Scripted>) -> Judgement {
        let backends = Arc::new(BackendRegistry::new().with(AKASH_BACKEND, api));
        Judgement::new(
            PersonalityRegistry::builtin(),
            backends,
            &JudgementConfig::default(),
        )
    }

    #[tokio::test]
    async fn consensus_short_circuits_arbiter() {
        let api = Arc::new(Scripted::new(vec![], "I approve. Confidence: 8/10"));
        let judgement = service(api.clone());

        let verdict = judgement.judge("Pineapple belongs on pizza").await;
        assert_eq!(verdict, "I approve. Confidence: 8/10");
        // Three baseline judges, no arbiter.
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn disagreement_goes_to_arbiter() {
        let api = Arc::new(Scripted::new(
            vec![
                ("Meta-Llama-3-2-3B-Instruct", "I disapprove."),
                (ARBITER.model, "On balance, acceptable."),
            ],
            "I approve.",
        ));
        let judgement = service(api.clone());

        let verdict = judgement.judge("Pineapple belongs on pizza").await;
        assert_eq!(verdict, "On balance, acceptable.");
        assert_eq!(api.calls(), 4);
    }

    #[tokio::test]
    async fn empty_statement_is_rejected() {
        let api = Arc::new(Scripted::new(vec![], "I approve."));
        let judgement = service(api.clone());
        assert_eq!(judgement.judge("   ").await, NO_STATEMENT);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn cache_hit_makes_no_calls_until_ttl_expires() {
        let api = Arc::new(Scripted::new(vec![], "Good. Confidence: 9/10"));
        let clock = Arc::new(ManualClock(AtomicU64::new(10_000)));
        let judgement = service(api.clone()).with_clock(clock.clone());

        let first = judgement.judge("Tabs over spaces").await;
        let calls_after_first = api.calls();

        clock.0.store(10_000 + 3_599, Ordering::SeqCst);
        let second = judgement.judge("Tabs over spaces").await;
        assert_eq!(first, second);
        assert_eq!(api.calls(), calls_after_first);

        clock.0.store(10_000 + 3_600 + 1, Ordering::SeqCst);
        judgement.judge("Tabs over spaces").await;
        assert!(api.calls() > calls_after_first);
    }

    #[tokio::test]
    async fn selection_failure_uses_uncached_fallback() {
        let api = Arc::new(Scripted::new(vec![], "Neutral take: acceptable."));
        let backends = Arc::new(BackendRegistry::new().with(AKASH_BACKEND, api.clone()));
        // Only the neutral personality exists, so the baseline panel cannot
        // be resolved but the fallback judge can.
        let mut registry = PersonalityRegistry::empty();
        registry.insert("neutral", "be neutral");
        let judgement = Judgement::new(registry, backends, &JudgementConfig::default());

        assert_eq!(judgement.judge("anything").await, "Neutral take: acceptable.");
        assert_eq!(api.calls(), 1);
        // Not cached: a second call asks again.
        judgement.judge("anything").await;
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn failing_fallback_reports_unavailable() {
        let api = Arc::new(Scripted::new(vec![], ""));
        let backends = Arc::new(BackendRegistry::new().with(AKASH_BACKEND, api));
        let mut registry = PersonalityRegistry::empty();
        registry.insert("neutral", "be neutral");
        let judgement = Judgement::new(registry, backends, &JudgementConfig::default());

        assert_eq!(judgement.judge("anything").await, UNAVAILABLE);
    }

    #[tokio::test]
    async fn no_personalities_at_all_reports_unavailable() {
        let api = Arc::new(Scripted::new(vec![], "I approve."));
        let backends = Arc::new(BackendRegistry::new().with(AKASH_BACKEND, api));
        let judgement = Judgement::new(
            PersonalityRegistry::empty(),
            backends,
            &JudgementConfig::default(),
        );
        assert_eq!(judgement.judge("anything").await, UNAVAILABLE);
    }

    #[tokio::test]
    async fn all_judges_down_still_returns_text() {
        let api = Arc::new(Scripted::new(vec![], ""));
        let judgement = service(api);
        // Degraded outcomes are neutral, so the arbiter is asked and fails too.
        let verdict = judgement.judge("Pineapple belongs on pizza").await;
        assert_eq!(verdict, SYNTHESIS_FAILED);
    }

    #[test]
    fn stage_labels() {
        assert_eq!(JudgementStage::CacheCheck.label(), "cache-check");
        assert_eq!(JudgementStage::Fallback.label(), "fallback");
    }
}
