//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Two groups of endpoints share one router. `/api/llm/*` exposes the
//! gateway directly for clients that keep their own card state.
//! `/api/sessions/*` drives a server-owned session, returning the session
//! snapshot after each synchronous transition while the stream fills the
//! card in the background.

pub mod llm;
pub mod sessions;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::llm::types::LlmError;
use crate::session::SessionError;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/llm/stream", post(llm::stream))
        .route("/api/llm/followups", post(llm::followups))
        .route("/api/llm/expand", post(llm::expand))
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/sessions/{id}/reset", post(sessions::reset_session))
        .route("/api/sessions/{id}/questions", post(sessions::submit_question))
        .route("/api/sessions/{id}/reject", post(sessions::reject))
        .route("/api/sessions/{id}/accept", post(sessions::accept))
        .route("/api/sessions/{id}/badges", post(sessions::select_badge))
        .route("/api/sessions/{id}/select", post(sessions::select_card))
        .route("/api/sessions/{id}/cycle", post(sessions::cycle_variant))
        .route("/api/sessions/{id}/sections", post(sessions::request_sections))
        .route("/api/sessions/{id}/drag", post(sessions::drag))
        .route("/api/sessions/{id}/swipe", post(sessions::swipe))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// ERRORS
// =============================================================================

/// JSON error body: `{error, message, retryable}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    pub(crate) fn session_not_found(id: Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "E_SESSION_NOT_FOUND",
            message: format!("session not found: {id}"),
            retryable: false,
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code: "E_BAD_REQUEST", message: message.into(), retryable: false }
    }

    fn from_code(status: StatusCode, err: &impl ErrorCode) -> Self {
        Self { status, code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match err {
            SessionError::EmptyQuestion | SessionError::EmptyBadge | SessionError::IndexOutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            SessionError::NoCards | SessionError::InvalidState { .. } | SessionError::NoVariants(_) => {
                StatusCode::CONFLICT
            }
        };
        Self::from_code(status, &err)
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        Self::from_code(StatusCode::BAD_GATEWAY, &err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.code,
            "message": self.message,
            "retryable": self.retryable,
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
