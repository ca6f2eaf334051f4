//! Structured expansion — ask for a JSON array of titled sections and parse
//! it leniently.
//!
//! Models often wrap JSON in code fences or prose. Parsing takes the
//! substring between the first `[` and the last `]`; anything unusable
//! collapses into a single section holding the raw reply.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::types::ChatMessage;

pub const FALLBACK_SECTION_TITLE: &str = "Overview";

pub const EXPAND_INSTRUCTION: &str = "\
Expand the previous answer into 2-4 focused sections.
Respond ONLY with a JSON array. Each element must be an object with two string fields:
\"title\" (2-5 words) and \"content\" (markdown, at most 6 lines).
Do not add any text before or after the array.";

/// One titled segment of an expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

/// Append the JSON instruction to a conversation.
#[must_use]
pub fn expand_messages(conversation: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = conversation.to_vec();
    messages.push(ChatMessage::user(EXPAND_INSTRUCTION));
    messages
}

/// Remove markdown code-fence markers (```` ```json ```` and ```` ``` ````).
#[must_use]
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// Parse a reply into sections. Never empty.
#[must_use]
pub fn parse_sections(reply: &str) -> Vec<Section> {
    let cleaned = strip_code_fences(reply);
    let parsed = extract_array(&cleaned).map(|items| items.iter().filter_map(section_from_value).collect::<Vec<_>>());

    match parsed {
        Some(sections) if !sections.is_empty() => sections,
        _ => vec![Section { title: FALLBACK_SECTION_TITLE.to_string(), content: cleaned.trim().to_string() }],
    }
}

fn extract_array(text: &str) -> Option<Vec<Value>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Vec<Value>>(&text[start..=end]).ok()
}

fn section_from_value(value: &Value) -> Option<Section> {
    let title = value.get("title").and_then(Value::as_str)?.trim();
    let content = value.get("content").and_then(Value::as_str)?.trim();
    if title.is_empty() || content.is_empty() {
        return None;
    }
    Some(Section { title: title.to_string(), content: content.to_string() })
}

/// Render sections as one markdown document (`### title` + content).
#[must_use]
pub fn sections_markdown(sections: &[Section]) -> String {
    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(out, "### {}\n\n{}", section.title, section.content);
    }
    out
}

#[cfg(test)]
#[path = "expand_test.rs"]
mod tests;
