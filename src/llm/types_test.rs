use super::*;
use crate::error::ErrorCode;

// =============================================================================
// LlmError::error_code
// =============================================================================

#[test]
fn error_code_missing_api_key() {
    let err = LlmError::MissingApiKey { var: "KEY".into() };
    assert_eq!(err.error_code(), "E_MISSING_API_KEY");
    assert!(err.to_string().contains("KEY"));
}

#[test]
fn error_code_api_response() {
    let err = LlmError::ApiResponse { status: 500, body: "oops".into() };
    assert_eq!(err.error_code(), "E_API_RESPONSE");
}

#[test]
fn error_code_stream() {
    let err = LlmError::Stream("upstream closed".into());
    assert_eq!(err.error_code(), "E_STREAM");
}

// =============================================================================
// LlmError::retryable
// =============================================================================

#[test]
fn retryable_transport_and_server_errors() {
    assert!(LlmError::ApiRequest("conn refused".into()).retryable());
    assert!(LlmError::ApiResponse { status: 429, body: String::new() }.retryable());
    assert!(LlmError::ApiResponse { status: 503, body: String::new() }.retryable());
}

#[test]
fn not_retryable_client_errors() {
    assert!(!LlmError::ApiResponse { status: 401, body: "unauthorized".into() }.retryable());
    assert!(!LlmError::ApiParse("json".into()).retryable());
    assert!(!LlmError::ConfigParse("bad".into()).retryable());
}

// =============================================================================
// serde shapes
// =============================================================================

#[test]
fn chat_message_serializes_lowercase_role() {
    let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
    assert_eq!(json, serde_json::json!({ "role": "assistant", "content": "hi" }));
}

#[test]
fn tier_deserializes_from_lowercase() {
    let tier: Tier = serde_json::from_str("\"slow\"").unwrap();
    assert_eq!(tier, Tier::Slow);
    assert!(serde_json::from_str::<Tier>("\"medium\"").is_err());
}

#[test]
fn tier_models_dispatch() {
    let models = TierModels { fast: "small".into(), slow: "large".into() };
    assert_eq!(models.model_for(Tier::Fast), "small");
    assert_eq!(models.model_for(Tier::Slow), "large");
}

#[test]
fn chat_request_builder_sets_sampling_options() {
    let req = ChatRequest::new("m", vec![ChatMessage::user("q")])
        .with_temperature(0.7)
        .with_max_tokens(50);
    assert_eq!(req.model, "m");
    assert_eq!(req.temperature, Some(0.7));
    assert_eq!(req.max_tokens, Some(50));
}
