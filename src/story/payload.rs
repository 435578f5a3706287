use std::borrow::Cow;

use anyhow::{Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>(.*?)</think>").expect("valid think-block regex"));

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*\n(.*?)\n?\s*```\s*$").expect("valid code-fence regex")
});

/// Remove `<think>` reasoning blocks and a surrounding markdown code fence
/// from model output. Text without either is returned unchanged.
pub fn strip_wrappers(raw: &str) -> Cow<'_, str> {
    for cap in THINK_BLOCK.captures_iter(raw) {
        let thought = cap.get(1).map_or("", |m| m.as_str()).trim();
        if !thought.is_empty() {
            debug!("Model thinking:\n{thought}");
        }
    }

    let cleaned = THINK_BLOCK.replace_all(raw, "");
    let fenced = CODE_FENCE
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    match fenced {
        Some(inner) => Cow::Owned(inner),
        None => cleaned,
    }
}

/// Parse a payload that is supposed to be a JSON document.
///
/// Tries the text as-is, then with model wrappers stripped. With `lenient`
/// set, falls back to the outermost `{...}` span so that chatter around a
/// JSON object does not sink the parse.
pub fn parse_json(raw: &str, lenient: bool) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Ok(value);
    }

    let cleaned = strip_wrappers(raw);
    let first_err = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    if !lenient {
        return Err(first_err).context("payload is not valid JSON");
    }

    let start = cleaned.find('{');
    let end = cleaned.rfind('}');
    let span = match (start, end) {
        (Some(s), Some(e)) if s < e => &cleaned[s..=e],
        _ => return Err(first_err).context("no JSON object found in payload"),
    };
    debug!("Extracted JSON span of {} chars", span.len());
    serde_json::from_str(span).context(format!("failed to parse JSON: {span}"))
}
