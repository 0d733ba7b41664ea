//! Judge selection — fixed baseline panel plus keyword-triggered specialists.

use crate::config::AKASH_BACKEND;
use crate::judgement::error::JudgementError;
use crate::judgement::judge::{JudgeConfig, JudgeTemplate};
use crate::judgement::personality::PersonalityRegistry;

// ---------------------------------------------------------------------------
// Static judge definitions
// ---------------------------------------------------------------------------

/// Generalist judges consulted on every statement, in this order.
pub static BASELINE: &[JudgeTemplate] = &[
    JudgeTemplate {
        name: "conservative",
        personality: "conservative",
        backend: AKASH_BACKEND,
        model: "nvidia-Llama-3-1-Nemotron-70B-Instruct-HF",
        temperature: 0.3,
    },
    JudgeTemplate {
        name: "liberal",
        personality: "liberal",
        backend: AKASH_BACKEND,
        model: "Meta-Llama-3-2-3B-Instruct",
        temperature: 0.7,
    },
    JudgeTemplate {
        name: "moderate",
        personality: "moderate",
        backend: AKASH_BACKEND,
        model: "Meta-Llama-4-Maverick-17B-128E-Instruct-FP8",
        temperature: 0.5,
    },
];

/// A specialist judge and the lower-case keywords that call it in.
pub struct SpecialistRule {
    pub keywords: &'static [&'static str],
    pub judge: JudgeTemplate,
}

/// Specialists, evaluated and appended in this order.
pub static SPECIALISTS: &[SpecialistRule] = &[
    SpecialistRule {
        keywords: &[
            "law", "legal", "court", "judge", "lawsuit", "contract", "statute", "constitution",
            "regulation", "legislation",
        ],
        judge: JudgeTemplate {
            name: "legal",
            personality: "legal",
            backend: AKASH_BACKEND,
            model: "Meta-Llama-3-3-70B-Instruct",
            temperature: 0.2,
        },
    },
    SpecialistRule {
        keywords: &[
            "medical", "medicine", "health", "doctor", "patient", "hospital", "disease",
            "vaccine", "drug", "treatment",
        ],
        judge: JudgeTemplate {
            name: "medical",
            personality: "medical",
            backend: AKASH_BACKEND,
            model: "Meta-Llama-3-3-70B-Instruct",
            temperature: 0.2,
        },
    },
    SpecialistRule {
        keywords: &[
            "environment", "climate", "pollution", "emission", "carbon", "wildlife", "forest",
            "recycling", "renewable", "fossil",
        ],
        judge: JudgeTemplate {
            name: "environmental",
            personality: "environmental",
            backend: AKASH_BACKEND,
            model: "Meta-Llama-3-3-70B-Instruct",
            temperature: 0.4,
        },
    },
];

// ---------------------------------------------------------------------------
// JudgeSelector
// ---------------------------------------------------------------------------

/// Picks the judges for a statement.
///
/// Selection is a pure function of the text: the baseline panel always comes
/// first, then each specialist whose keyword group matches the lower-cased
/// text, in [`SPECIALISTS`] order.
///
/// # Example
/// ```rust
/// use pal_assistant::judgement::{JudgeSelector, PersonalityRegistry};
///
/// let selector = JudgeSelector::new(PersonalityRegistry::builtin());
/// let judges = selector.select("Should this law be repealed?").unwrap();
/// assert_eq!(judges.len(), 4);
/// assert_eq!(judges[3].name, "legal");
/// ```
pub struct JudgeSelector {
    registry: PersonalityRegistry,
}

impl JudgeSelector {
    pub fn new(registry: PersonalityRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PersonalityRegistry {
        &self.registry
    }

    /// Names of the specialists triggered by `text`.
    pub fn matching_specialists(text: &str) -> Vec<&'static str> {
        triggered(text).map(|rule| rule.judge.name).collect()
    }

    /// Ordered judge configurations for `text`.
    ///
    /// Fails only when a template names a personality missing from the
    /// registry.
    pub fn select(&self, text: &str) -> Result<Vec<JudgeConfig>, JudgementError> {
        BASELINE
            .iter()
            .chain(triggered(text).map(|rule| &rule.judge))
            .map(|template| template.resolve(&self.registry))
            .collect()
    }
}

fn triggered(text: &str) -> impl Iterator<Item = &'static SpecialistRule> {
    let lowered = text.to_lowercase();
    SPECIALISTS
        .iter()
        .filter(move |rule| rule.keywords.iter().any(|kw| lowered.contains(kw)))
}
