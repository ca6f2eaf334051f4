//! Follow-up badges — short topic suggestions derived from a finished answer.
//!
//! DESIGN
//! ======
//! Two sources, selected once per process by `BADGE_SOURCE`:
//! - `llm` (default): one non-streamed call on the fast model, reply parsed as
//!   a comma-separated list.
//! - `heuristic`: a static keyword matcher over the question and answer.
//!
//! Neither path surfaces a failure. A bad or missing reply becomes
//! [`FALLBACK_BADGES`].

use std::sync::OnceLock;

use crate::llm::types::ChatMessage;

pub const MAX_BADGES: usize = 3;
pub const FALLBACK_BADGES: [&str; MAX_BADGES] = ["More Info", "Related Topics", "Deep Dive"];
pub const BADGE_MAX_TOKENS: u32 = 50;
pub const BADGE_TEMPERATURE: f32 = 0.7;

const BADGE_INSTRUCTION: &str = "\
You are generating 3 related topic badges based on a user's question and the AI's response.

Given the original question and response, suggest 3 short, relevant topics that the user might want to explore next.

Rules:
- Each badge should be 2-4 words maximum
- Make them specific and actionable
- Focus on related but distinct aspects of the topic
- Return as a simple comma-separated list WITHOUT quotes
- Do not use quotation marks around the badges

Example: Advanced Features, Common Issues, Best Practices";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeSource {
    Llm,
    Heuristic,
}

impl BadgeSource {
    /// Unknown values fall back to [`BadgeSource::Llm`].
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("heuristic") => Self::Heuristic,
            _ => Self::Llm,
        }
    }
}

/// Badge source configured by `BADGE_SOURCE`, read once.
pub fn badge_source() -> BadgeSource {
    static VALUE: OnceLock<BadgeSource> = OnceLock::new();
    *VALUE.get_or_init(|| BadgeSource::parse(std::env::var("BADGE_SOURCE").ok().as_deref()))
}

#[must_use]
pub fn fallback_badges() -> Vec<String> {
    FALLBACK_BADGES.iter().map(|b| (*b).to_string()).collect()
}

/// Messages for the badge completion call (system instruction included).
#[must_use]
pub fn followup_messages(question: &str, response: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(BADGE_INSTRUCTION),
        ChatMessage::user(format!(
            "Original question: \"{question}\"\n\nAI response: \"{response}\"\n\nGenerate 3 related topic badges:"
        )),
    ]
}

/// Parse a comma-separated reply into at most [`MAX_BADGES`] labels.
///
/// Returns `None` when nothing usable survives.
#[must_use]
pub fn parse_badges(reply: &str) -> Option<Vec<String>> {
    let badges: Vec<String> = reply
        .split(',')
        .map(|b| strip_quotes(b.trim()).trim().to_string())
        .filter(|b| !b.is_empty())
        .take(MAX_BADGES)
        .collect();
    if badges.is_empty() { None } else { Some(badges) }
}

/// Drop one leading and one trailing quote character.
fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    s.strip_suffix(['"', '\'']).unwrap_or(s)
}

// =============================================================================
// HEURISTIC
// =============================================================================

/// Keyword rule: when the question mentions `topic`, look at the answer to
/// decide which sense it took and suggest the other one.
struct SenseRule {
    topic: &'static str,
    /// Answer keywords for the first sense, and the badges offered when seen.
    first: (&'static [&'static str], &'static [&'static str]),
    /// Answer keywords for the second sense. Empty keywords match anything.
    second: (&'static [&'static str], &'static [&'static str]),
}

const SENSE_RULES: &[SenseRule] = &[
    SenseRule {
        topic: "virus",
        first: (&["biological", "disease"], &["computer viruses", "antivirus software"]),
        second: (&["computer", "software"], &["biological viruses", "immune system"]),
    },
    SenseRule {
        topic: "memory",
        first: (&["computer", "ram"], &["human memory", "psychology"]),
        second: (&["brain", "remember"], &["computer memory", "storage"]),
    },
    SenseRule {
        topic: "network",
        first: (&["computer", "internet"], &["social networks", "professional networking"]),
        second: (&["social", "people"], &["computer networks", "technical networking"]),
    },
    SenseRule {
        topic: "security",
        first: (&[], &["cyber security", "physical security", "financial security"]),
        second: (&[], &[]),
    },
    SenseRule {
        topic: "cloud",
        first: (&["computing", "server"], &["weather clouds", "meteorology"]),
        second: (&[], &["cloud computing", "technology"]),
    },
];

const GENERIC_BADGES: [&str; 3] = ["technical approach", "practical approach", "theoretical approach"];

/// Static keyword matcher. Always returns between 1 and [`MAX_BADGES`] labels.
#[must_use]
pub fn heuristic_badges(question: &str, response: &str) -> Vec<String> {
    let question = question.to_lowercase();
    let response = response.to_lowercase();
    let mentions = |words: &[&str]| words.is_empty() || words.iter().any(|w| response.contains(w));

    let mut badges: Vec<&str> = Vec::new();
    for rule in SENSE_RULES.iter().filter(|r| question.contains(r.topic)) {
        if mentions(rule.first.0) {
            badges.extend_from_slice(rule.first.1);
        } else if mentions(rule.second.0) {
            badges.extend_from_slice(rule.second.1);
        }
    }
    if badges.is_empty() {
        badges.extend_from_slice(&GENERIC_BADGES);
    }
    badges.into_iter().take(MAX_BADGES).map(str::to_string).collect()
}

#[cfg(test)]
#[path = "badges_test.rs"]
mod tests;
