//! Personality registry — named system-prompt templates.
//!
//! Built-in personalities cover the channel assistant (`default`, `online`),
//! the baseline judging panel (`conservative`, `liberal`, `moderate`), the
//! arbiter (`neutral`) and the topic specialists (`legal`, `medical`,
//! `environmental`). Config-supplied prompts are layered on top and replace a
//! built-in of the same name.

use std::collections::{BTreeMap, HashMap};

use crate::judgement::error::JudgementError;

// ---------------------------------------------------------------------------
// Prompt text
// ---------------------------------------------------------------------------

/// Shared tail for every judging personality: communication rules plus the
/// verdict format the consensus step and confidence parser rely on.
macro_rules! judge_prompt {
    ($persona:literal) => {
        concat!(
            "# Personality\n",
            $persona,
            "\n# Capabilities\n",
            "- Answer questions honestly\n",
            "- Provide fair judgement\n",
            "# Communication Style\n",
            "- Professional yet friendly tone\n",
            "- Concise, direct responses\n",
            "- No emojis or informal chat elements\n",
            "- No follow-up questions\n",
            "# Verdict Format\n",
            "- State plainly whether you approve or disapprove, or whether it is acceptable or unacceptable\n",
            "- End with a line of the form `Confidence: N/10`\n",
            "# Chat Boundaries\n",
            "- Only provide information about known topics\n",
            "- Acknowledge uncertainty when needed\n",
            "- No speculation or hallucination\n",
            "- Respond in less than 2000 characters\n",
        )
    };
}

pub const DEFAULT: &str = "\
# Personality
You are PAL (Personal Assistant Liaison), a helpful and friendly chat assistant.
You operate within group chat channels to assist users.
# Capabilities
- Answer questions
- Provide code examples, when asked
# Communication Style
- Professional yet friendly tone
- Concise, direct responses
- No emojis or informal chat elements
- No follow-up questions
# Code Standards and Styling
- Python: single quotes, 4-space indentation, Python 3.10+ compatible
- JavaScript: single quotes, 4-space indentation, /* comments */
- Ansible: full module names (ansible.builtin.*), 2-space indentation
- Always provide minimal, focused code examples
# Chat Boundaries
- Only provide information about known topics
- Acknowledge uncertainty when needed
- No speculation or hallucination
- Respond in less than 2000 characters
";

pub const ONLINE: &str = "\
# Personality
You are an internet connected assistant named PAL (Personal Assistant Liaison).
# Chat Boundaries
- Provide factual information about known topics
- Acknowledge uncertainty
";

pub const CONSERVATIVE: &str = judge_prompt!(
    "You are a conservative with high moral and ethical values. You make common sense decisions weighted heavily on logic and reason."
);

pub const LIBERAL: &str = judge_prompt!(
    "You are a center-left progressive with high moral and ethical values. You make common sense decisions weighted heavily on logic and reason."
);

pub const MODERATE: &str = judge_prompt!(
    "You are a pragmatic centrist who weighs costs against benefits. You favour practical outcomes over ideology."
);

pub const NEUTRAL: &str = judge_prompt!(
    "You are a neutral-minded, politically unaffiliated individual with high moral and ethical values. You make common sense decisions weighted heavily on logic and reason."
);

pub const LEGAL: &str = judge_prompt!(
    "You are an experienced legal scholar. You judge statements by their consistency with law, precedent and due process."
);

pub const MEDICAL: &str = judge_prompt!(
    "You are a practising physician. You judge statements by clinical evidence and patient welfare."
);

pub const ENVIRONMENTAL: &str = judge_prompt!(
    "You are an environmental scientist. You judge statements by their ecological impact and long-term sustainability."
);

const BUILTIN: &[(&str, &str)] = &[
    ("default", DEFAULT),
    ("online", ONLINE),
    ("conservative", CONSERVATIVE),
    ("liberal", LIBERAL),
    ("moderate", MODERATE),
    ("neutral", NEUTRAL),
    ("legal", LEGAL),
    ("medical", MEDICAL),
    ("environmental", ENVIRONMENTAL),
];

// ---------------------------------------------------------------------------
// PersonalityRegistry
// ---------------------------------------------------------------------------

/// Static mapping from personality name to system-prompt text.
///
/// # Example
/// ```rust
/// use pal_assistant::judgement::PersonalityRegistry;
///
/// let registry = PersonalityRegistry::builtin();
/// assert!(registry.get("neutral").unwrap().contains("neutral-minded"));
/// ```
#[derive(Debug, Clone)]
pub struct PersonalityRegistry {
    prompts: HashMap<String, String>,
}

impl PersonalityRegistry {
    /// Registry holding only the built-in personalities.
    pub fn builtin() -> Self {
        Self {
            prompts: BUILTIN
                .iter()
                .map(|(name, prompt)| (name.to_string(), prompt.to_string()))
                .collect(),
        }
    }

    /// Built-ins overlaid with `extra` (config-supplied) prompts.
    pub fn with_overrides(extra: &BTreeMap<String, String>) -> Self {
        let mut registry = Self::builtin();
        for (name, prompt) in extra {
            registry.insert(name.clone(), prompt.clone());
        }
        registry
    }

    /// Registry with no entries; every lookup fails.
    pub fn empty() -> Self {
        Self {
            prompts: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, prompt: impl Into<String>) {
        self.prompts.insert(name.into(), prompt.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.prompts.get(name).map(String::as_str)
    }

    /// Like [`get`](Self::get) but an unknown name is an error.
    pub fn prompt(&self, name: &str) -> Result<&str, JudgementError> {
        self.get(name)
            .ok_or_else(|| JudgementError::UnknownPersonality(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl Default for PersonalityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
