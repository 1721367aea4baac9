//! Traffic logging for LLM API calls
//!
//! Emits request/response summaries under the `traffic` target.
//! Content is truncated to avoid leaking private data in logs.

use tracing::{debug, warn};

/// Maximum characters to log for content
const MAX_CONTENT_LOG_CHARS: usize = 200;

/// Truncate a string for logging, adding ellipsis if truncated
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars total)", truncated, char_count)
    }
}

fn summarize(payload: &impl serde::Serialize) -> String {
    let json =
        serde_json::to_string(payload).unwrap_or_else(|_| "<serialization error>".to_string());
    truncate_for_log(&json, MAX_CONTENT_LOG_CHARS)
}

/// Log an LLM request (truncated summary only)
pub fn log_request(model: &str, request: &impl serde::Serialize) {
    debug!(target: "traffic", model, event = "REQUEST", "{}", summarize(request));
}

/// Log an LLM response (truncated summary only)
pub fn log_response(model: &str, response: &impl serde::Serialize) {
    debug!(target: "traffic", model, event = "RESPONSE", "{}", summarize(response));
}

/// Log an LLM error
pub fn log_error(model: &str, error: &str) {
    warn!(target: "traffic", model, event = "ERROR", "{}", error);
}
