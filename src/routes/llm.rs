//! Direct gateway routes for clients that keep their own card state.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Json, Response};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ApiError;
use crate::llm::types::{ChatMessage, Role, Tier};
use crate::services::expand::Section;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StreamBody {
    pub messages: Vec<ChatMessage>,
    pub tier: Tier,
}

#[derive(Deserialize)]
pub struct FollowupsBody {
    pub question: String,
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct FollowupsResponse {
    pub badges: Vec<String>,
}

#[derive(Deserialize)]
pub struct ExpandBody {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ExpandResponse {
    pub sections: Vec<Section>,
}

/// `POST /api/llm/stream` — plain-text body of chunks as they arrive.
///
/// A rejected upstream call is a 502. A failure after the first byte can
/// only abort the body.
pub async fn stream(State(state): State<AppState>, Json(body): Json<StreamBody>) -> Result<Response, ApiError> {
    conversation_only(&body.messages)?;
    let chunks = state.gateway.stream(&body.messages, body.tier).await?;
    let chunks = chunks.inspect(|item| {
        if let Err(e) = item {
            warn!(error = %e, "llm route: stream aborted");
        }
    });

    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], Body::from_stream(chunks)).into_response())
}

/// `POST /api/llm/followups` — up to three follow-up topics. Never fails.
pub async fn followups(State(state): State<AppState>, Json(body): Json<FollowupsBody>) -> Json<FollowupsResponse> {
    let badges = state.gateway.summarize_followups(&body.question, &body.response).await;
    Json(FollowupsResponse { badges })
}

/// `POST /api/llm/expand` — structured sections for a conversation.
pub async fn expand(
    State(state): State<AppState>,
    Json(body): Json<ExpandBody>,
) -> Result<Json<ExpandResponse>, ApiError> {
    conversation_only(&body.messages)?;
    let sections = state.gateway.structured_expand(&body.messages).await;
    Ok(Json(ExpandResponse { sections }))
}

/// Client turns are user or assistant; the system prompt is ours.
fn conversation_only(messages: &[ChatMessage]) -> Result<(), ApiError> {
    if messages.iter().any(|m| m.role == Role::System) {
        return Err(ApiError::bad_request("system messages are not accepted"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "llm_test.rs"]
mod tests;
