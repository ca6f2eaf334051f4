//! Line handling for chat-completions server-sent events.
//!
//! DESIGN
//! ======
//! Framing is done upstream by `LinesCodec`, so this module only ever sees
//! complete lines with the terminator already stripped. Split lines and split
//! UTF-8 characters never reach it.

use serde_json::Value;

use super::types::LlmError;

/// One decoded item from the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A non-empty text delta.
    Delta(String),
    /// The `[DONE]` sentinel.
    Done,
}

/// Decode one event-stream line.
///
/// Blank separators, `:` comments, non-`data` fields and empty deltas yield
/// `Ok(None)`.
///
/// # Errors
///
/// Returns an error for an undecodable payload or an in-band provider error.
pub fn parse_line(line: &str) -> Result<Option<SseEvent>, LlmError> {
    let Some(payload) = line.trim_end_matches('\r').strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(None);
    }
    if payload == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }
    parse_delta(payload).map(|delta| delta.map(SseEvent::Delta))
}

/// Extract `choices[0].delta.content` from one event payload.
pub(crate) fn parse_delta(payload: &str) -> Result<Option<String>, LlmError> {
    let root: Value = serde_json::from_str(payload).map_err(|e| LlmError::ApiParse(e.to_string()))?;

    if let Some(err) = root.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| err.to_string(), str::to_owned);
        return Err(LlmError::Stream(message));
    }

    let text = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(Value::as_str)
        .unwrap_or("");
    if text.is_empty() { Ok(None) } else { Ok(Some(text.to_string())) }
}

#[cfg(test)]
#[path = "sse_test.rs"]
mod tests;
