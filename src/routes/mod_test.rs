use super::*;
use crate::session::CardId;
use crate::session::CardState;

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn session_errors_map_to_status() {
    assert_eq!(ApiError::from(SessionError::EmptyQuestion).status, StatusCode::BAD_REQUEST);
    assert_eq!(
        ApiError::from(SessionError::IndexOutOfRange { index: 3, len: 1 }).status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(ApiError::from(SessionError::NoCards).status, StatusCode::CONFLICT);
    let invalid = SessionError::InvalidState { card: CardId(1), state: CardState::FastResponding, action: "expand" };
    let api = ApiError::from(invalid);
    assert_eq!(api.status, StatusCode::CONFLICT);
    assert_eq!(api.code, "E_INVALID_STATE");
    assert!(api.message.contains("fast_responding"));
}

#[test]
fn llm_errors_are_bad_gateway_with_retry_hint() {
    let api = ApiError::from(LlmError::ApiResponse { status: 429, body: "slow down".into() });
    assert_eq!(api.status, StatusCode::BAD_GATEWAY);
    assert!(api.retryable);

    let api = ApiError::from(LlmError::ApiResponse { status: 401, body: String::new() });
    assert!(!api.retryable);
}

#[tokio::test]
async fn error_body_shape() {
    let response = ApiError::session_not_found(Uuid::nil()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "E_SESSION_NOT_FOUND");
    assert_eq!(json["retryable"], false);
    assert!(json["message"].as_str().unwrap().contains(&Uuid::nil().to_string()));
}

#[tokio::test]
async fn healthz_is_ok() {
    assert_eq!(healthz().await, StatusCode::OK);
}
