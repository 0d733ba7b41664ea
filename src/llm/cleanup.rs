//! Post-processing of model output before it reaches the channel.

use std::sync::LazyLock;

use regex::Regex;

static THINK_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-tag pattern"));

/// Number of citations rendered under a reply.
pub const MAX_CITATIONS: usize = 3;

/// Remove `<think>…</think>` reasoning blocks (across lines, non-greedy).
pub fn strip_think_tags(text: &str) -> String {
    THINK_TAGS.replace_all(text, "").into_owned()
}

/// Render the first [`MAX_CITATIONS`] sources as a quoted, numbered list.
///
/// Returns an empty string when there are no citations.
pub fn format_citations(citations: &[String]) -> String {
    if citations.is_empty() {
        return String::new();
    }
    let mut text = String::from("Citations:\n");
    for (i, url) in citations.iter().take(MAX_CITATIONS).enumerate() {
        text.push_str(&format!("> [{}] {url}\n", i + 1));
    }
    text
}
