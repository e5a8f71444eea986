//! Transcript flattening.
//!
//! Turns a conversation payload into the plain-text timeline given to the
//! extraction model: one `role: text` line per usable turn, historical turns
//! first, original order kept within each section.

use serde_json::Value;

use factsink_types::payload::{ContextItem, ConversationPayload};

/// Build the newline-joined transcript for `payload`.
///
/// Turns missing either `role` or `content` contribute nothing.
pub fn build_transcript(payload: &ConversationPayload) -> String {
    payload
        .turns()
        .filter_map(transcript_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one turn as `role: text`, or `None` when it lacks a role or content.
pub fn transcript_line(item: &ContextItem) -> Option<String> {
    let role = item.role.as_ref()?;
    let content = item.content.as_ref()?;
    Some(format!("{}: {}", render(role), turn_text(item, content)))
}

/// Pick the text for a turn.
///
/// `content.text` wins. Without it the whole content is rendered, and an
/// empty content falls back to rendering the whole item.
fn turn_text(item: &ContextItem, content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("text") {
            Some(text) if !text.is_null() => render(text),
            _ if !map.is_empty() => content.to_string(),
            _ => compact(item),
        },
        Value::Array(items) if !items.is_empty() => content.to_string(),
        Value::Bool(true) | Value::Number(_) => content.to_string(),
        _ => compact(item),
    }
}

/// Strings verbatim, everything else as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compact(item: &ContextItem) -> String {
    serde_json::to_string(item).unwrap_or_default()
}
