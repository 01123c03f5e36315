//! Result envelope and coercion of raw delegate output

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::preview;

/// Normalized delegate result. `response` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: response.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            success: false,
            response: response.into(),
            error: Some(error.into()),
        }
    }

    fn empty_response() -> Self {
        Self::failure("empty response", "The agent returned an empty response.")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.response.clone())
    }
}

/// What a transport hands back before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Structured(Map<String, Value>),
    Text(String),
}

/// Normalize raw delegate output into an envelope
pub fn coerce(raw: RawOutput) -> Envelope {
    match raw {
        RawOutput::Structured(map) => coerce_structured(map),
        RawOutput::Text(text) => coerce_text(text),
    }
}

fn coerce_structured(map: Map<String, Value>) -> Envelope {
    let response = match map.get("response") {
        None | Some(Value::Null) => {
            return Envelope::failure(
                "missing response field",
                "The agent returned a result without a response field.",
            )
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    if response.trim().is_empty() {
        return Envelope::empty_response();
    }

    let error = match map.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };
    // A populated error always means failure, whatever `success` claims.
    let claimed = map.get("success").and_then(Value::as_bool).unwrap_or(true);
    let success = error.is_none() && claimed;

    Envelope {
        success,
        response,
        error,
    }
}

fn coerce_text(text: String) -> Envelope {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Envelope::empty_response();
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return coerce_structured(map);
    }

    // Brace-leading text that failed to parse as an object is treated as
    // broken JSON, even if it was meant as prose.
    if trimmed.starts_with('{') {
        debug!("Rejecting malformed JSON output: {}", preview(trimmed, 100));
        return Envelope::failure(
            "malformed response",
            "The agent returned a malformed JSON response.",
        );
    }

    Envelope::ok(text)
}
