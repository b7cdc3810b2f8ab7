//! JSON extraction from reasoning-service responses
//!
//! Model output is natural language that usually, but not always, contains a
//! JSON object somewhere inside it: after a preamble, inside a code fence,
//! followed by commentary, or next to other brace-delimited fragments. The
//! functions here find that object without trusting the surrounding text.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Decoded JSON object
pub type JsonObject = Map<String, Value>;

/// Maximum length of raw text quoted in error messages
const RAW_EXCERPT_LEN: usize = 200;

/// Only the first 16 KiB of a response are searched for JSON
///
/// Each opening brace rescans forward to its balanced close, so the search is
/// quadratic in the scanned length. Replies requested at the configured token
/// limit are a small fraction of this.
pub const MAX_SCAN_BYTES: usize = 16 * 1024;

/// Extract the first JSON object in `text` that contains every required key
///
/// Every `{` in the text starts a candidate that runs to its balanced `}`.
/// Candidates are tried left to right by opening brace, so an outer object is
/// tried before the objects nested inside it. Candidates that fail to decode,
/// decode to something other than an object, or lack a required key are
/// skipped. Only when no candidate qualifies is an error returned.
///
/// Text past [`MAX_SCAN_BYTES`] is ignored, so an object that starts or ends
/// beyond it is not found.
pub fn extract_json_object(text: &str, required_keys: &[&str]) -> Result<JsonObject> {
    let scanned = &text[..floor_char_boundary(text, MAX_SCAN_BYTES)];
    let mut saw_object = false;

    for (start, end) in candidate_spans(scanned) {
        let candidate = &scanned[start..=end];
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(candidate) else {
            continue;
        };
        saw_object = true;

        if required_keys.iter().all(|k| object.contains_key(*k)) {
            return Ok(object);
        }
    }

    let reason = if saw_object {
        format!("No JSON object with keys [{}]", required_keys.join(", "))
    } else {
        "No JSON found in AI response".to_string()
    };
    Err(Error::Parse(format!(
        "{} | Raw: {}",
        reason,
        excerpt(text.trim())
    )))
}

/// Byte ranges (inclusive) of every balanced brace span, by opening position
///
/// Lazy, so the scan stops at the first qualifying candidate.
fn candidate_spans(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'{')
        .filter_map(move |(start, _)| matching_close(bytes, start).map(|end| (start, end)))
}

/// Find the `}` that balances the `{` at `start`
///
/// Braces inside JSON string literals do not count. Operates on bytes, which
/// is safe because `{`, `}`, `"` and `\` never occur inside a multi-byte
/// UTF-8 sequence.
fn matching_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Largest char boundary at or below `max`
fn floor_char_boundary(text: &str, max: usize) -> usize {
    if text.len() <= max {
        return text.len();
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}

/// Truncate long responses for error messages
fn excerpt(text: &str) -> String {
    if text.len() > RAW_EXCERPT_LEN {
        format!("{}...", &text[..floor_char_boundary(text, RAW_EXCERPT_LEN)])
    } else {
        text.to_string()
    }
}
