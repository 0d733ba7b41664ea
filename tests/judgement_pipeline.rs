//! End-to-end behaviour of the judgement service over scripted backends.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use pal_assistant::config::{JudgementConfig, AKASH_BACKEND};
use pal_assistant::judgement::{
    Clock, InMemoryStore, Judgement, JudgementCache, PersonalityRegistry, Sentiment,
    SentimentClassifier,
};
use pal_assistant::llm::{
    BackendRegistry, Completion, CompletionApi, CompletionError, CompletionRequest,
};

/// Answers judges by system prompt keyword and the arbiter by transcript.
struct Panel {
    answers: Vec<(&'static str, &'static str)>,
    default: &'static str,
    arbiter: &'static str,
    delay: Duration,
    judge_calls: AtomicUsize,
    arbiter_calls: AtomicUsize,
}

impl Panel {
    fn new(answers: Vec<(&'static str, &'static str)>, default: &'static str) -> Self {
        Self {
            answers,
            default,
            arbiter: "Final judgement: repeal with a transition period.",
            delay: Duration::ZERO,
            judge_calls: AtomicUsize::new(0),
            arbiter_calls: AtomicUsize::new(0),
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.judge_calls.load(Ordering::SeqCst) + self.arbiter_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionApi for Panel {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        tokio::time::sleep(self.delay).await;
        let system = &request.messages[0].content;
        let user = &request.messages[1].content;

        if user.contains("# Judgement Statement") {
            self.arbiter_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(Completion::text(self.arbiter));
        }

        self.judge_calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .iter()
            .find(|(marker, _)| system.contains(*marker))
            .map_or(self.default, |(_, a)| *a);
        Ok(Completion::text(answer))
    }
}

struct FixedClock(AtomicU64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

struct AlwaysPositive;

impl SentimentClassifier for AlwaysPositive {
    fn classify(&self, _text: &str) -> Sentiment {
        Sentiment::Positive
    }
}

fn judgement(panel: Arc<Panel>) -> Judgement {
    let backends = Arc::new(BackendRegistry::new().with(AKASH_BACKEND, panel));
    Judgement::new(
        PersonalityRegistry::builtin(),
        backends,
        &JudgementConfig::default(),
    )
}

fn mixed_panel() -> Panel {
    Panel::new(
        vec![
            ("conservative", "I disapprove of repealing it. Confidence: 7/10"),
            ("center-left", "I approve of repealing it. Confidence: 8/10"),
        ],
        "The outcome depends on details. Confidence: 5/10",
    )
}

#[tokio::test]
async fn mixed_panel_is_synthesized_and_cached() {
    let panel = Arc::new(mixed_panel());
    let service = judgement(panel.clone());

    let verdict = service.judge("Should this law be repealed?").await;
    assert_eq!(verdict, "Final judgement: repeal with a transition period.");
    // Three baseline judges plus the legal specialist, then the arbiter.
    assert_eq!(panel.judge_calls.load(Ordering::SeqCst), 4);
    assert_eq!(panel.arbiter_calls.load(Ordering::SeqCst), 1);

    let again = service.judge("  Should this law be repealed?\n").await;
    assert_eq!(again, verdict);
    assert_eq!(panel.calls(), 5);
}

#[tokio::test]
async fn judges_run_concurrently() {
    let panel = Arc::new(mixed_panel().slow(Duration::from_millis(150)));
    let service = judgement(panel.clone());

    let started = Instant::now();
    service.judge("Should this law be repealed?").await;
    let elapsed = started.elapsed();

    // Four judges in parallel plus one arbiter call: two delays, not five.
    assert!(elapsed < Duration::from_millis(600), "took {elapsed:?}");
}

#[tokio::test]
async fn swapped_classifier_changes_consensus() {
    let panel = Arc::new(mixed_panel());
    let service = judgement(panel.clone()).with_classifier(Box::new(AlwaysPositive));

    let verdict = service.judge("Should this law be repealed?").await;
    // Everyone "agrees", so the first judge's answer stands.
    assert_eq!(verdict, "I disapprove of repealing it. Confidence: 7/10");
    assert_eq!(panel.arbiter_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cache_store_is_shared_between_services() {
    let store = Arc::new(InMemoryStore::new());
    let cache = || JudgementCache::new(store.clone(), Duration::from_secs(3600));

    let first = Arc::new(mixed_panel());
    let second = Arc::new(mixed_panel());
    let a = judgement(first.clone()).with_cache(cache());
    let b = judgement(second.clone()).with_cache(cache());

    let verdict = a.judge("Is remote work good for teams?").await;
    assert_eq!(b.judge("Is remote work good for teams?").await, verdict);
    assert_eq!(second.calls(), 0);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn expired_verdict_is_recomputed() {
    let panel = Arc::new(mixed_panel());
    let clock = Arc::new(FixedClock(AtomicU64::new(1_000_000)));
    let service = judgement(panel.clone()).with_clock(clock.clone());

    service.judge("Is nuclear power acceptable?").await;
    let calls = panel.calls();

    clock.0.fetch_add(3_599, Ordering::SeqCst);
    service.judge("Is nuclear power acceptable?").await;
    assert_eq!(panel.calls(), calls);

    clock.0.fetch_add(2, Ordering::SeqCst);
    service.judge("Is nuclear power acceptable?").await;
    assert!(panel.calls() > calls);
}

#[tokio::test]
async fn specialists_join_on_keywords() {
    let panel = Arc::new(Panel::new(vec![], "I approve. Confidence: 9/10"));
    let service = judgement(panel.clone());

    service
        .judge("Should the hospital cut carbon emissions under the new regulation?")
        .await;
    // Baseline three plus legal, medical and environmental; consensus, no arbiter.
    assert_eq!(panel.judge_calls.load(Ordering::SeqCst), 6);
    assert_eq!(panel.arbiter_calls.load(Ordering::SeqCst), 0);
}
