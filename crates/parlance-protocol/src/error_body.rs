//! Player-facing message extraction from service error bodies.
//!
//! Layered fallback, first hit wins:
//! 1. a direct `message` field;
//! 2. a status-like field (`status`, also inside a `detail` mapping),
//!    re-cased into a sentence;
//! 3. the part of a raw `detail` string before its first colon;
//! 4. a generic message.

use parlance_core::error::GENERIC_FAILURE_MESSAGE;
use serde_json::{Map, Value};

/// Extracts the message to show the player from a non-success body.
#[must_use]
pub fn extract_service_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .as_ref()
        .and_then(Value::as_object)
        .and_then(message_from)
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_owned())
}

fn message_from(object: &Map<String, Value>) -> Option<String> {
    if let Some(message) = non_empty_str(object.get("message")) {
        return Some(message.to_owned());
    }
    if let Some(status) = non_empty_str(object.get("status")) {
        return Some(sentence_case(status));
    }
    match object.get("detail")? {
        Value::Object(nested) => message_from(nested),
        Value::String(detail) => legacy_mapping(detail)
            .as_ref()
            .and_then(message_from)
            .or_else(|| first_segment(detail)),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Some backends stringify a Python dict into `detail`, e.g.
/// `"{'status': 'rate_limited'}"`. Quote-swapping is enough for the flat
/// mappings seen in practice; anything richer falls through.
fn legacy_mapping(detail: &str) -> Option<Map<String, Value>> {
    let trimmed = detail.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return None;
    }
    match serde_json::from_str::<Value>(&trimmed.replace('\'', "\"")) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn first_segment(detail: &str) -> Option<String> {
    detail
        .split(':')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// `"rate_limited"` becomes `"Rate limited"`.
fn sentence_case(status: &str) -> String {
    let words: Vec<String> = status
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let sentence = words.join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
