//! Session driver — runs generations against the gateway and feeds their
//! results back into a shared [`Session`].
//!
//! DESIGN
//! ======
//! The session lock is a `std::sync::Mutex` and is never held across an
//! await: each callback locks, applies one transition, and releases. A
//! generation task ends as soon as its ticket is cancelled, and every
//! callback it makes is re-validated by the session anyway.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{CardState, Completion, Generation, Session, SessionError};
use crate::gesture::{DragPreview, DragTracker, SwipeOutcome};
use crate::llm::types::TierModels;
use crate::services::gateway::Gateway;

pub type SessionHandle = Arc<Mutex<Session>>;

#[must_use]
pub fn new_handle(models: TierModels) -> SessionHandle {
    Arc::new(Mutex::new(Session::new(models)))
}

pub fn lock(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A user action that starts a generation.
#[derive(Debug, Clone)]
pub enum Intent {
    Submit(String),
    Reject,
    Accept,
    Badge(String),
}

/// Apply `intent` and spawn the generation it starts.
///
/// # Errors
///
/// Returns the session's refusal; nothing is spawned in that case.
pub fn dispatch(
    handle: &SessionHandle,
    gateway: &Arc<Gateway>,
    intent: Intent,
) -> Result<JoinHandle<()>, SessionError> {
    let ticket = start(&mut lock(handle), intent)?;
    Ok(spawn_generation(Arc::clone(handle), Arc::clone(gateway), ticket))
}

fn start(session: &mut Session, intent: Intent) -> Result<Generation, SessionError> {
    match intent {
        Intent::Submit(question) => session.submit_question(&question),
        Intent::Reject => session.reject(),
        Intent::Accept => session.accept(),
        Intent::Badge(badge) => session.select_badge(&badge),
    }
}

/// Resolve a released drag against the selected card and act on it.
///
/// # Errors
///
/// Returns the session's refusal for a swipe that maps to an intent the
/// card cannot take.
pub fn swipe(
    handle: &SessionHandle,
    gateway: &Arc<Gateway>,
    offset_x: f64,
) -> Result<(SwipeOutcome, Option<JoinHandle<()>>), SessionError> {
    let (outcome, ticket) = swipe_ticket(&mut lock(handle), offset_x)?;
    let task = ticket.map(|ticket| spawn_generation(Arc::clone(handle), Arc::clone(gateway), ticket));
    Ok((outcome, task))
}

/// Judge the drag and take the ticket it starts under the same lock, so the
/// card acted on is the card that was judged.
fn swipe_ticket(session: &mut Session, offset_x: f64) -> Result<(SwipeOutcome, Option<Generation>), SessionError> {
    let (mut drag, state) = drag_on_selected(session, offset_x)?;
    let outcome = drag.release(state);
    let ticket = match outcome {
        SwipeOutcome::Reject => Some(start(session, Intent::Reject)?),
        SwipeOutcome::Accept => Some(start(session, Intent::Accept)?),
        SwipeOutcome::SnapBack => None,
    };
    Ok((outcome, ticket))
}

/// Transform for the selected card dragged to `offset_x`, without acting.
///
/// # Errors
///
/// Returns [`SessionError::NoCards`] on an empty session.
pub fn drag_preview(handle: &SessionHandle, offset_x: f64) -> Result<DragPreview, SessionError> {
    let session = lock(handle);
    let (drag, state) = drag_on_selected(&session, offset_x)?;
    Ok(drag.preview(state))
}

/// A drag from rest to `offset_x` on the selected card. The drag never
/// starts while the session is loading or that card is streaming.
fn drag_on_selected(session: &Session, offset_x: f64) -> Result<(DragTracker, CardState), SessionError> {
    let card = session.selected_card().ok_or(SessionError::NoCards)?;
    let blocked = session.loading() || session.streaming_card() == Some(card.id);
    if blocked {
        debug!(card = %card.id, "driver: drag ignored while generating");
    }
    let mut drag = DragTracker::new();
    drag.start(0.0, blocked);
    drag.update(offset_x);
    Ok((drag, card.state))
}

/// Run one generation on its own task.
pub fn spawn_generation(handle: SessionHandle, gateway: Arc<Gateway>, ticket: Generation) -> JoinHandle<()> {
    tokio::spawn(run_generation(handle, gateway, ticket))
}

async fn run_generation(handle: SessionHandle, gateway: Arc<Gateway>, ticket: Generation) {
    let opened = tokio::select! {
        biased;
        () = ticket.cancel.cancelled() => {
            debug!(card = %ticket.card_id, "driver: cancelled before stream opened");
            return;
        }
        result = gateway.stream(&ticket.messages, ticket.tier) => result,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            warn!(card = %ticket.card_id, error = %e, "driver: stream request failed");
            lock(&handle).fail(&ticket, &e);
            return;
        }
    };

    let mut chunks = 0_usize;
    loop {
        let next = tokio::select! {
            biased;
            () = ticket.cancel.cancelled() => {
                debug!(card = %ticket.card_id, chunks, "driver: stream cancelled");
                return;
            }
            item = stream.next() => item,
        };
        match next {
            Some(Ok(chunk)) => {
                if !lock(&handle).apply_chunk(&ticket, &chunk) {
                    return;
                }
                chunks += 1;
                debug!(card = %ticket.card_id, len = chunk.len(), "driver: chunk");
            }
            Some(Err(e)) => {
                warn!(card = %ticket.card_id, error = %e, chunks, "driver: stream failed");
                lock(&handle).fail(&ticket, &e);
                return;
            }
            None => break,
        }
    }

    let completion = lock(&handle).complete(&ticket);
    if let Some(done) = completion.filter(|c| c.state == CardState::FastComplete) {
        attach_badges(&handle, &gateway, done).await;
    }
}

async fn attach_badges(handle: &SessionHandle, gateway: &Gateway, done: Completion) {
    let badges = gateway.summarize_followups(&done.question, &done.response).await;
    if lock(handle).set_badges(done.card_id, done.generation, badges) {
        debug!(card = %done.card_id, "driver: badges attached");
    }
}

/// Fetch a structured expansion for the selected card in the background.
///
/// # Errors
///
/// Returns [`SessionError::InvalidState`] unless the card is `detailed_complete`.
pub fn spawn_sections(handle: &SessionHandle, gateway: &Arc<Gateway>) -> Result<JoinHandle<()>, SessionError> {
    let request = lock(handle).sections_request()?;
    let handle = Arc::clone(handle);
    let gateway = Arc::clone(gateway);
    Ok(tokio::spawn(async move {
        let sections = gateway.structured_expand(&request.messages).await;
        let count = sections.len();
        if lock(&handle).add_sections(request.card_id, request.generation, sections) {
            info!(card = %request.card_id, count, "driver: sections attached");
        }
    }))
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
