//! Best-effort JSON recovery from free-text model output.
//!
//! Models wrap JSON in markdown fences, preambles, and trailing commentary.
//! Recovery tries, in order: a fenced ``` block, the outermost `{...}`, the
//! outermost `[...]`, then a raw parse. Structurally invalid JSON is never
//! repaired or guessed at — the caller supplies its own deterministic
//! fallback.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extracts the first recoverable JSON value from `text`, or `None`.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Some(fenced) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str(fenced) {
            return Some(value);
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(candidate) = outermost(text, open, close) {
            if let Ok(value) = serde_json::from_str(candidate) {
                return Some(value);
            }
        }
    }

    serde_json::from_str(text.trim()).ok()
}

/// Typed variant of [`extract_json`]. Recovered-but-wrong-shape JSON also
/// yields `None`.
pub fn extract_typed<T: DeserializeOwned>(text: &str) -> Option<T> {
    extract_json(text).and_then(|value| serde_json::from_value(value).ok())
}

/// Content of the first ``` fenced block, with an optional `json` tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body = after_fence
        .strip_prefix("json")
        .unwrap_or(after_fence)
        .trim_start();
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Slice from the first `open` through the last `close`, if both exist in
/// that order.
fn outermost(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}
