//! Consensus detection over judge outcomes.
//!
//! Sentiment classification sits behind [`SentimentClassifier`] so the
//! keyword heuristic can be swapped without touching the threshold logic.

use crate::judgement::judge::JudgeOutcome;

/// Default fraction of judges that must agree.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Numeric vote: +1, -1 or 0.
    pub fn vote(self) -> i8 {
        match self {
            Sentiment::Positive => 1,
            Sentiment::Negative => -1,
            Sentiment::Neutral => 0,
        }
    }
}

pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Sentiment;
}

// ---------------------------------------------------------------------------
// KeywordClassifier
// ---------------------------------------------------------------------------

const NEGATIVE: &[&str] = &["disapprove", "bad", "unacceptable"];
const POSITIVE: &[&str] = &["approve", "good", "acceptable"];

/// Case-insensitive substring heuristic.
///
/// Negative keywords are checked first: every positive keyword is a
/// substring of a negative one ("disapprove" contains "approve").
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl SentimentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Sentiment {
        let lowered = text.to_lowercase();
        if NEGATIVE.iter().any(|kw| lowered.contains(kw)) {
            Sentiment::Negative
        } else if POSITIVE.iter().any(|kw| lowered.contains(kw)) {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        }
    }
}

// ---------------------------------------------------------------------------
// ConsensusDetector
// ---------------------------------------------------------------------------

/// Decides whether the judges agree.
///
/// The reference sentiment is always the first outcome's. Consensus holds
/// when at least `threshold` of all outcomes (neutral ones included in the
/// denominator) share it and it is not neutral.
///
/// # Example
/// ```rust
/// use pal_assistant::judgement::{ConsensusDetector, JudgeOutcome};
///
/// let detector = ConsensusDetector::default();
/// let outcomes = vec![
///     JudgeOutcome::answered("a", "I approve."),
///     JudgeOutcome::answered("b", "I disapprove."),
/// ];
/// assert!(!detector.has_consensus(&outcomes));
/// ```
pub struct ConsensusDetector {
    classifier: Box<dyn SentimentClassifier>,
    threshold: f32,
}

impl ConsensusDetector {
    pub fn new(classifier: Box<dyn SentimentClassifier>, threshold: f32) -> Self {
        Self {
            classifier,
            threshold,
        }
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self::new(Box::new(KeywordClassifier), threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Fraction of outcomes sharing the first outcome's sentiment, and that
    /// sentiment. `None` for an empty slice.
    pub fn agreement(&self, outcomes: &[JudgeOutcome]) -> Option<(Sentiment, f32)> {
        let sentiments: Vec<Sentiment> = outcomes
            .iter()
            .map(|o| self.classifier.classify(&o.response))
            .collect();
        let reference = *sentiments.first()?;
        let agreeing = sentiments.iter().filter(|s| **s == reference).count();
        Some((reference, agreeing as f32 / sentiments.len() as f32))
    }

    pub fn has_consensus(&self, outcomes: &[JudgeOutcome]) -> bool {
        if outcomes.len() < 2 {
            return false;
        }
        match self.agreement(outcomes) {
            Some((reference, ratio)) => {
                log::debug!("consensus check: reference {reference:?}, agreement {ratio:.2}");
                reference != Sentiment::Neutral && ratio >= self.threshold
            }
            None => false,
        }
    }
}

impl Default for ConsensusDetector {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(texts: &[&str]) -> Vec<JudgeOutcome> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| JudgeOutcome::answered(format!("j{i}"), *t))
            .collect()
    }

    #[test]
    fn classifies_keywords() {
        let c = KeywordClassifier;
        assert_eq!(c.classify("I APPROVE of this"), Sentiment::Positive);
        assert_eq!(c.classify("That is a good idea"), Sentiment::Positive);
        assert_eq!(c.classify("I disapprove"), Sentiment::Negative);
        assert_eq!(c.classify("Unacceptable outcome"), Sentiment::Negative);
        assert_eq!(c.classify("It is complicated"), Sentiment::Neutral);
        assert_eq!(Sentiment::Negative.vote(), -1);
    }

    #[test]
    fn unanimous_positive_mix_is_consensus() {
        let d = ConsensusDetector::default();
        let o = outcomes(&["approve the plan", "approve, with notes", "good call overall"]);
        assert!(d.has_consensus(&o));
    }

    #[test]
    fn split_pair_is_not_consensus() {
        let d = ConsensusDetector::default();
        assert!(!d.has_consensus(&outcomes(&["approve", "disapprove"])));
    }

    #[test]
    fn single_outcome_is_never_consensus() {
        let d = ConsensusDetector::default();
        assert!(!d.has_consensus(&outcomes(&["approve"])));
        assert!(!d.has_consensus(&[]));
    }

    #[test]
    fn neutral_reference_blocks_consensus() {
        let d = ConsensusDetector::default();
        assert!(!d.has_consensus(&outcomes(&["hmm", "no opinion", "unclear"])));
    }

    #[test]
    fn neutral_votes_count_in_denominator() {
        let d = ConsensusDetector::default();
        // 4 of 5 positive = 0.8, meets the threshold exactly.
        let o = outcomes(&["approve", "good", "acceptable", "approve", "no comment"]);
        assert!(d.has_consensus(&o));
        // 3 of 4 positive = 0.75.
        let o = outcomes(&["approve", "good", "acceptable", "no comment"]);
        assert!(!d.has_consensus(&o));
    }

    #[test]
    fn reference_is_first_outcome_not_majority() {
        let d = ConsensusDetector::with_threshold(0.5);
        // Majority positive, but the first judge is negative: 1/3 agree.
        let o = outcomes(&["bad idea", "approve", "approve"]);
        assert_eq!(d.agreement(&o), Some((Sentiment::Negative, 1.0 / 3.0)));
        assert!(!d.has_consensus(&o));
    }

    #[test]
    fn custom_classifier_is_used() {
        struct AlwaysPositive;
        impl SentimentClassifier for AlwaysPositive {
            fn classify(&self, _text: &str) -> Sentiment {
                Sentiment::Positive
            }
        }
        let d = ConsensusDetector::new(Box::new(AlwaysPositive), 0.8);
        assert!(d.has_consensus(&outcomes(&["x", "y"])));
    }
}
