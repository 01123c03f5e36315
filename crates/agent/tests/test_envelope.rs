//! Tests for delegate output coercion

use serde_json::json;
use zai_agent::delegate::{coerce, Envelope, RawOutput};

fn structured(value: serde_json::Value) -> RawOutput {
    RawOutput::Structured(value.as_object().cloned().unwrap())
}

#[test]
fn test_envelope_text_passes_through() {
    let envelope = coerce(RawOutput::Text(
        r#"{"success": true, "response": "EBITDA is..."}"#.to_string(),
    ));
    assert_eq!(envelope, Envelope::ok("EBITDA is..."));
}

#[test]
fn test_structured_passes_through_error_and_success() {
    let envelope = coerce(structured(json!({
        "success": false,
        "response": "Report not found",
        "error": "no such ticker"
    })));
    assert!(!envelope.success);
    assert_eq!(envelope.response, "Report not found");
    assert_eq!(envelope.error.as_deref(), Some("no such ticker"));
}

#[test]
fn test_success_defaults_to_absence_of_error() {
    let ok = coerce(structured(json!({"response": "fine"})));
    assert!(ok.success);

    let failed = coerce(structured(json!({"response": "partial", "error": "timeout upstream"})));
    assert!(!failed.success);

    let null_error = coerce(structured(json!({"response": "fine", "error": null})));
    assert!(null_error.success);
    assert_eq!(null_error.error, None);
}

#[test]
fn test_error_field_overrides_claimed_success() {
    let envelope = coerce(structured(json!({
        "success": true,
        "response": "partial answer",
        "error": "upstream quota exhausted"
    })));
    assert!(!envelope.success);
    assert_eq!(envelope.response, "partial answer");
    assert_eq!(envelope.error.as_deref(), Some("upstream quota exhausted"));
}

#[test]
fn test_explicit_failure_without_error_stays_failed() {
    let envelope = coerce(structured(json!({"success": false, "response": "no data"})));
    assert!(!envelope.success);
    assert_eq!(envelope.error, None);
}

#[test]
fn test_missing_response_field_is_failure() {
    let envelope = coerce(structured(json!({"success": true, "data": [1, 2]})));
    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("missing response field"));
    assert!(!envelope.response.is_empty());
}

#[test]
fn test_plain_text_is_success_verbatim() {
    let text = "The P/E ratio compares price to earnings.\n";
    let envelope = coerce(RawOutput::Text(text.to_string()));
    assert!(envelope.success);
    assert_eq!(envelope.response, text);
    assert_eq!(envelope.error, None);
}

#[test]
fn test_malformed_json_rejected() {
    let envelope = coerce(RawOutput::Text("{not valid json".to_string()));
    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("malformed response"));
    assert!(!envelope.response.is_empty());
}

#[test]
fn test_brace_leading_prose_is_rejected_as_malformed() {
    // Prose that happens to start with `{` cannot be told apart from broken JSON.
    let envelope = coerce(RawOutput::Text("  {braces} are used for sets".to_string()));
    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("malformed response"));
}

#[test]
fn test_blank_text_is_empty_response() {
    for text in ["", "   ", "\n\t"] {
        let envelope = coerce(RawOutput::Text(text.to_string()));
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("empty response"));
        assert!(!envelope.response.is_empty());
    }
}

#[test]
fn test_envelope_json_shape() {
    let value: serde_json::Value =
        serde_json::from_str(&Envelope::failure("boom", "It failed").to_json()).unwrap();
    assert_eq!(
        value,
        json!({"success": false, "response": "It failed", "error": "boom"})
    );
}
