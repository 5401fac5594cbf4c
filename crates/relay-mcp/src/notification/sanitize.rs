//! Log Payload Sanitization
//!
//! Log payloads leave the process, so they are scrubbed before emission:
//! object keys matching a case-insensitive dictionary of sensitive tokens
//! have their values redacted, and string bodies are regex-scrubbed for
//! `key=value` / `key: value` patterns over the same vocabulary. The
//! traversal is stateless and may run on any worker.

// Layer 1: Standard library imports
use std::sync::OnceLock;

// Layer 2: Third-party crate imports
use regex::Regex;
use serde_json::Value;

// Layer 3: Internal module imports
// (None)

/// Replacement for scrubbed values
pub const REDACTED: &str = "[REDACTED]";

/// Sensitive key vocabulary; matching is case-insensitive substring so
/// `refresh_token` and `ApiKey` are caught by their stems
const SENSITIVE_TOKENS: [&str; 12] = [
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "authorization",
    "credential",
    "private_key",
    "session_id",
    "cookie",
    "signature",
];

fn key_is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_TOKENS.iter().any(|token| key.contains(token))
}

fn value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // `password=...`, `api_key: ...` and friends inside string bodies.
        #[allow(clippy::unwrap_used)]
        Regex::new(
            r#"(?i)\b([a-z0-9_\-]*(?:password|passwd|secret|token|api_key|apikey|authorization|credential|private_key|session_id|cookie|signature)[a-z0-9_\-]*)\s*[=:]\s*[^\s,;&"']+"#,
        )
        .unwrap()
    })
}

/// Scrub `key=value` patterns from a string body
pub fn sanitize_text(text: &str) -> String {
    value_pattern()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!("{}={REDACTED}", &caps[1])
        })
        .into_owned()
}

/// Recursively sanitize a JSON value tree
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    if key_is_sensitive(key) {
                        (key.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (key.clone(), sanitize_value(val))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::String(text) => Value::String(sanitize_text(text)),
        other => other.clone(),
    }
}
