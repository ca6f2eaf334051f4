//! Server-owned session routes.
//!
//! Every mutating route applies one synchronous transition and returns the
//! snapshot right away. Streams fill the card in afterwards; clients poll
//! `GET /api/sessions/{id}` to watch the text grow.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::ApiError;
use crate::gesture::{DragPreview, SwipeOutcome};
use crate::session::SessionSnapshot;
use crate::session::driver::{self, Intent, SessionHandle};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub id: Uuid,
}

#[derive(Deserialize)]
pub struct QuestionBody {
    pub question: String,
}

#[derive(Deserialize)]
pub struct BadgeBody {
    pub badge: String,
}

#[derive(Deserialize)]
pub struct SelectBody {
    pub index: usize,
}

#[derive(Deserialize)]
pub struct SwipeBody {
    pub offset_x: f64,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub outcome: SwipeOutcome,
    pub session: SessionSnapshot,
}

async fn session_handle(state: &AppState, id: Uuid) -> Result<SessionHandle, ApiError> {
    state.session(id).await.ok_or_else(|| ApiError::session_not_found(id))
}

fn snapshot(handle: &SessionHandle) -> Json<SessionSnapshot> {
    Json(driver::lock(handle).snapshot())
}

/// `POST /api/sessions` — start an empty session.
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<CreatedSession>) {
    let id = state.create_session().await;
    info!(%id, "session created");
    (StatusCode::CREATED, Json(CreatedSession { id }))
}

/// `GET /api/sessions/:id` — current snapshot.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = session_handle(&state, id).await?;
    Ok(snapshot(&handle))
}

/// `DELETE /api/sessions/:id` — cancel the live stream and drop the session.
pub async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    state.remove_session(id).await.ok_or_else(|| ApiError::session_not_found(id))?;
    info!(%id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/sessions/:id/reset` — clear every card and cancel the live stream.
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = session_handle(&state, id).await?;
    driver::lock(&handle).reset();
    Ok(snapshot(&handle))
}

/// `POST /api/sessions/:id/questions` — ask a new question.
pub async fn submit_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<QuestionBody>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    run_intent(&state, id, Intent::Submit(body.question)).await
}

/// `POST /api/sessions/:id/reject` — regenerate the selected card's question.
pub async fn reject(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SessionSnapshot>, ApiError> {
    run_intent(&state, id, Intent::Reject).await
}

/// `POST /api/sessions/:id/accept` — expand the selected card.
pub async fn accept(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SessionSnapshot>, ApiError> {
    run_intent(&state, id, Intent::Accept).await
}

/// `POST /api/sessions/:id/badges` — follow a badge topic.
pub async fn select_badge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<BadgeBody>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    run_intent(&state, id, Intent::Badge(body.badge)).await
}

async fn run_intent(state: &AppState, id: Uuid, intent: Intent) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = session_handle(state, id).await?;
    driver::dispatch(&handle, &state.gateway, intent)?;
    Ok(snapshot(&handle))
}

/// `POST /api/sessions/:id/select` — change the visible card.
pub async fn select_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SelectBody>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = session_handle(&state, id).await?;
    driver::lock(&handle).select(body.index)?;
    Ok(snapshot(&handle))
}

/// `POST /api/sessions/:id/cycle` — show the next cached expansion.
pub async fn cycle_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = session_handle(&state, id).await?;
    driver::lock(&handle).cycle_variant()?;
    Ok(snapshot(&handle))
}

/// `POST /api/sessions/:id/sections` — fetch a sectioned expansion (202).
pub async fn request_sections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionSnapshot>), ApiError> {
    let handle = session_handle(&state, id).await?;
    driver::spawn_sections(&handle, &state.gateway)?;
    Ok((StatusCode::ACCEPTED, snapshot(&handle)))
}

/// `POST /api/sessions/:id/drag` — card transform for an in-progress drag.
pub async fn drag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SwipeBody>,
) -> Result<Json<DragPreview>, ApiError> {
    let offset_x = finite_offset(body.offset_x)?;
    let handle = session_handle(&state, id).await?;
    Ok(Json(driver::drag_preview(&handle, offset_x)?))
}

/// `POST /api/sessions/:id/swipe` — released drag offset in pixels.
pub async fn swipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SwipeBody>,
) -> Result<Json<SwipeResponse>, ApiError> {
    let offset_x = finite_offset(body.offset_x)?;
    let handle = session_handle(&state, id).await?;
    let (outcome, _task) = driver::swipe(&handle, &state.gateway, offset_x)?;
    let Json(session) = snapshot(&handle);
    Ok(Json(SwipeResponse { outcome, session }))
}

fn finite_offset(offset_x: f64) -> Result<f64, ApiError> {
    if offset_x.is_finite() {
        Ok(offset_x)
    } else {
        Err(ApiError::bad_request("offset_x must be a finite number"))
    }
}

#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;
