//! Session state store — the card list, the selection, and the single
//! in-flight generation.
//!
//! DESIGN
//! ======
//! `Session` is a plain synchronous state machine. Every transition goes
//! through one of its methods; the async side (`driver`) only opens streams
//! and feeds results back in. This keeps all invariants checkable without a
//! runtime.
//!
//! Cards are addressed by stable [`CardId`], never by list position. Each
//! (re)generation of a card bumps its `generation` counter and is described
//! by a [`Generation`] ticket. Chunk, completion, and failure callbacks are
//! accepted only while their ticket is the live one, so a late callback from
//! a superseded stream can never write into a card that has moved on.
//!
//! Cancellation is cooperative: starting a generation cancels the previous
//! ticket's [`CancellationToken`]; the reading task notices between chunks.

pub mod driver;

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::llm::types::{ChatMessage, LlmError, Tier, TierModels};
use crate::services::expand::{self, Section};

pub const REJECT_INSTRUCTION: &str = "I don't like this reasoning, approach the problem in another way";
pub const ACCEPT_INSTRUCTION: &str = "I like this approach. Please provide a more comprehensive, detailed, and \
                                      improved answer. Keep it concise and screen-friendly (under 10 lines).";

// =============================================================================
// CARD
// =============================================================================

/// Opaque, creation-ordered card identifier. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    FastResponding,
    FastComplete,
    DetailedResponding,
    DetailedComplete,
}

impl CardState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FastResponding => "fast_responding",
            Self::FastComplete => "fast_complete",
            Self::DetailedResponding => "detailed_responding",
            Self::DetailedComplete => "detailed_complete",
        }
    }
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question/answer exchange.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub id: CardId,
    pub question: String,
    pub response: String,
    /// Model that produced (or is producing) `response`.
    pub model: String,
    pub state: CardState,
    /// Follow-up topics. Only present in `fast_complete`.
    pub badges: Option<Vec<String>>,
    /// Cached expansions, oldest first.
    pub detailed_variants: Vec<String>,
    /// Index into `detailed_variants` currently shown as `response`.
    pub current_variant: Option<usize>,
    pub sections: Vec<Section>,
    pub created_at_ms: i64,
    #[serde(skip)]
    generation: u64,
}

impl Card {
    fn new(id: CardId, question: String, model: String) -> Self {
        Self {
            id,
            question,
            response: String::new(),
            model,
            state: CardState::FastResponding,
            badges: None,
            detailed_variants: Vec::new(),
            current_variant: None,
            sections: Vec::new(),
            created_at_ms: now_ms(),
            generation: 0,
        }
    }
}

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// TICKETS
// =============================================================================

/// Everything the driver needs to run one stream for one card.
#[derive(Debug, Clone)]
pub struct Generation {
    pub card_id: CardId,
    pub generation: u64,
    pub tier: Tier,
    pub messages: Vec<ChatMessage>,
    pub cancel: CancellationToken,
}

/// Result of a successful [`Session::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub card_id: CardId,
    pub generation: u64,
    pub state: CardState,
    pub question: String,
    pub response: String,
}

/// Input for a structured-expansion fetch on a finished card.
#[derive(Debug, Clone)]
pub struct SectionsRequest {
    pub card_id: CardId,
    pub generation: u64,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug)]
struct ActiveStream {
    card_id: CardId,
    generation: u64,
    cancel: CancellationToken,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("badge is empty")]
    EmptyBadge,
    #[error("session has no cards")]
    NoCards,
    #[error("card {card} is {state}; cannot {action}")]
    InvalidState { card: CardId, state: CardState, action: &'static str },
    #[error("card index {index} out of range ({len} cards)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("card {0} has no alternate expansions")]
    NoVariants(CardId),
}

impl crate::error::ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyQuestion => "E_EMPTY_QUESTION",
            Self::EmptyBadge => "E_EMPTY_BADGE",
            Self::NoCards => "E_NO_CARDS",
            Self::InvalidState { .. } => "E_INVALID_STATE",
            Self::IndexOutOfRange { .. } => "E_INDEX_OUT_OF_RANGE",
            Self::NoVariants(_) => "E_NO_VARIANTS",
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Serializable view of a session for clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub cards: Vec<Card>,
    pub selected: usize,
    pub loading: bool,
    /// Card currently receiving chunks, if any.
    pub streaming: Option<CardId>,
}

pub struct Session {
    /// Most recent first.
    cards: Vec<Card>,
    selected: usize,
    /// Set when a generation starts, cleared on its first chunk or its end.
    loading: bool,
    active: Option<ActiveStream>,
    models: TierModels,
    next_id: u64,
}

impl Session {
    #[must_use]
    pub fn new(models: TierModels) -> Self {
        Self { cards: Vec::new(), selected: 0, loading: false, active: None, models, next_id: 1 }
    }

    #[cfg(test)]
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[cfg(test)]
    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected_card(&self) -> Option<&Card> {
        self.cards.get(self.selected)
    }

    #[cfg(test)]
    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Card whose stream is currently live.
    #[must_use]
    pub fn streaming_card(&self) -> Option<CardId> {
        self.active.as_ref().map(|a| a.card_id)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            cards: self.cards.clone(),
            selected: self.selected,
            loading: self.loading,
            streaming: self.streaming_card(),
        }
    }

    // -------------------------------------------------------------------------
    // user intents
    // -------------------------------------------------------------------------

    /// Create a card for a new question and start its fast generation.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyQuestion`] for a blank question.
    pub fn submit_question(&mut self, question: &str) -> Result<Generation, SessionError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        let mut messages = self.history_excluding(None);
        messages.push(ChatMessage::user(question));

        let id = self.push_card(question.to_string());
        info!(card = %id, "session: question submitted");
        Ok(self.begin(id, Tier::Fast, messages))
    }

    /// Regenerate the selected card's question as a brand-new card, steering
    /// away from the rejected answer. The rejected card is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoCards`] when there is nothing to reject.
    pub fn reject(&mut self) -> Result<Generation, SessionError> {
        let current = self.selected_card().ok_or(SessionError::NoCards)?;
        let (rejected_id, question, response) = (current.id, current.question.clone(), current.response.clone());

        let mut messages = self.history_excluding(Some(rejected_id));
        messages.push(ChatMessage::user(question.clone()));
        messages.push(ChatMessage::assistant(response));
        messages.push(ChatMessage::user(REJECT_INSTRUCTION));

        let id = self.push_card(question);
        info!(card = %id, rejected = %rejected_id, "session: answer rejected");
        Ok(self.begin(id, Tier::Fast, messages))
    }

    /// Expand the selected card in place with the slow tier.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the card is `fast_complete`.
    pub fn accept(&mut self) -> Result<Generation, SessionError> {
        let idx = self.require_selected(CardState::FastComplete, "expand")?;
        let card_id = self.cards[idx].id;

        let mut messages = self.history_excluding(Some(card_id));
        let card = &mut self.cards[idx];
        messages.push(ChatMessage::user(card.question.clone()));
        messages.push(ChatMessage::assistant(std::mem::take(&mut card.response)));
        messages.push(ChatMessage::user(ACCEPT_INSTRUCTION));

        card.state = CardState::DetailedResponding;
        card.badges = None;
        card.model = self.models.slow.clone();

        info!(card = %card_id, "session: answer accepted, expanding");
        Ok(self.begin(card_id, Tier::Slow, messages))
    }

    /// Regenerate the selected card in place, focused on a follow-up topic.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyBadge`] for a blank badge and
    /// [`SessionError::InvalidState`] unless the card is `fast_complete`.
    pub fn select_badge(&mut self, badge: &str) -> Result<Generation, SessionError> {
        let badge = badge.trim();
        if badge.is_empty() {
            return Err(SessionError::EmptyBadge);
        }
        let idx = self.require_selected(CardState::FastComplete, "follow a badge")?;
        let card_id = self.cards[idx].id;

        let mut messages = self.history_excluding(Some(card_id));
        let card = &mut self.cards[idx];
        messages.push(ChatMessage::user(format!("{}\n\nPlease focus specifically on: {badge}", card.question)));

        card.state = CardState::FastResponding;
        card.response.clear();
        card.badges = None;
        card.sections.clear();
        card.model = self.models.fast.clone();

        info!(card = %card_id, %badge, "session: badge selected");
        Ok(self.begin(card_id, Tier::Fast, messages))
    }

    /// Change the visible card. No network activity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IndexOutOfRange`] past the end of the list.
    pub fn select(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.cards.len() {
            return Err(SessionError::IndexOutOfRange { index, len: self.cards.len() });
        }
        self.selected = index;
        Ok(())
    }

    /// Show the next cached expansion of the selected card.
    ///
    /// # Errors
    ///
    /// Returns an error unless the selected card is `detailed_complete` with
    /// more than one cached expansion.
    pub fn cycle_variant(&mut self) -> Result<usize, SessionError> {
        let idx = self.require_selected(CardState::DetailedComplete, "cycle expansions")?;
        let card = &mut self.cards[idx];
        if card.detailed_variants.len() < 2 {
            return Err(SessionError::NoVariants(card.id));
        }
        let next = card.current_variant.map_or(0, |i| (i + 1) % card.detailed_variants.len());
        card.current_variant = Some(next);
        card.response.clone_from(&card.detailed_variants[next]);
        Ok(next)
    }

    /// Describe a structured-expansion fetch for the selected card.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the card is `detailed_complete`.
    pub fn sections_request(&self) -> Result<SectionsRequest, SessionError> {
        let idx = self.require_selected(CardState::DetailedComplete, "split into sections")?;
        let card = &self.cards[idx];
        let mut messages = self.history_excluding(Some(card.id));
        messages.push(ChatMessage::user(card.question.clone()));
        messages.push(ChatMessage::assistant(card.response.clone()));
        Ok(SectionsRequest { card_id: card.id, generation: card.generation, messages })
    }

    /// Drop every card and cancel any live stream.
    pub fn reset(&mut self) {
        self.cancel_active();
        self.cards.clear();
        self.selected = 0;
        self.loading = false;
        info!("session: reset");
    }

    // -------------------------------------------------------------------------
    // stream callbacks
    // -------------------------------------------------------------------------

    /// Append a chunk. Returns `false` (and changes nothing) for a stale ticket.
    pub fn apply_chunk(&mut self, ticket: &Generation, chunk: &str) -> bool {
        if !self.is_live(ticket) {
            return false;
        }
        let Some(card) = self.cards.iter_mut().find(|c| c.id == ticket.card_id) else {
            return false;
        };
        card.response.push_str(chunk);
        self.loading = false;
        true
    }

    /// Move the ticket's card to its `_complete` state.
    pub fn complete(&mut self, ticket: &Generation) -> Option<Completion> {
        if !self.is_live(ticket) {
            return None;
        }
        self.active = None;
        self.loading = false;

        let card = self.cards.iter_mut().find(|c| c.id == ticket.card_id)?;
        match card.state {
            CardState::FastResponding => card.state = CardState::FastComplete,
            CardState::DetailedResponding => {
                card.state = CardState::DetailedComplete;
                card.detailed_variants.push(card.response.clone());
                card.current_variant = Some(card.detailed_variants.len() - 1);
            }
            other => {
                warn!(card = %card.id, state = %other, "session: completion for a card that was not responding");
                return None;
            }
        }
        info!(card = %card.id, state = %card.state, response_len = card.response.len(), "session: generation complete");
        Some(Completion {
            card_id: card.id,
            generation: card.generation,
            state: card.state,
            question: card.question.clone(),
            response: card.response.clone(),
        })
    }

    /// Record a stream failure. The card keeps its partial text and state.
    pub fn fail(&mut self, ticket: &Generation, error: &LlmError) -> bool {
        if !self.is_live(ticket) {
            return false;
        }
        warn!(card = %ticket.card_id, error = %error, "session: generation failed");
        self.active = None;
        self.loading = false;
        true
    }

    /// Attach follow-up badges if the card is still the finished fast answer
    /// they were computed for.
    pub fn set_badges(&mut self, card_id: CardId, generation: u64, badges: Vec<String>) -> bool {
        let Some(card) = self.card_mut_at(card_id, generation, CardState::FastComplete) else {
            debug!(card = %card_id, "session: dropping stale badges");
            return false;
        };
        card.badges = Some(badges);
        true
    }

    /// Store sections and cache their rendering as an extra expansion.
    pub fn add_sections(&mut self, card_id: CardId, generation: u64, sections: Vec<Section>) -> bool {
        if sections.is_empty() {
            return false;
        }
        let Some(card) = self.card_mut_at(card_id, generation, CardState::DetailedComplete) else {
            debug!(card = %card_id, "session: dropping stale sections");
            return false;
        };
        card.detailed_variants.push(expand::sections_markdown(&sections));
        card.sections = sections;
        true
    }

    // -------------------------------------------------------------------------
    // history
    // -------------------------------------------------------------------------

    /// Conversation so far, oldest first: one user/assistant pair per card
    /// with a non-empty response, skipping `exclude`.
    #[must_use]
    pub fn history_excluding(&self, exclude: Option<CardId>) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        for card in self.cards.iter().rev() {
            if Some(card.id) == exclude || card.response.trim().is_empty() {
                continue;
            }
            messages.push(ChatMessage::user(card.question.clone()));
            messages.push(ChatMessage::assistant(card.response.clone()));
        }
        messages
    }

    // -------------------------------------------------------------------------
    // internals
    // -------------------------------------------------------------------------

    fn push_card(&mut self, question: String) -> CardId {
        let id = CardId(self.next_id);
        self.next_id += 1;
        self.cards.insert(0, Card::new(id, question, self.models.fast.clone()));
        self.selected = 0;
        id
    }

    /// Cancel whatever is live and register a new generation for `card_id`.
    fn begin(&mut self, card_id: CardId, tier: Tier, messages: Vec<ChatMessage>) -> Generation {
        self.cancel_active();

        let generation = match self.cards.iter_mut().find(|c| c.id == card_id) {
            Some(card) => {
                card.generation += 1;
                card.generation
            }
            None => 0,
        };
        let cancel = CancellationToken::new();
        self.active = Some(ActiveStream { card_id, generation, cancel: cancel.clone() });
        self.loading = true;

        Generation { card_id, generation, tier, messages, cancel }
    }

    fn cancel_active(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(card = %active.card_id, generation = active.generation, "session: cancelling live stream");
            active.cancel.cancel();
        }
    }

    fn is_live(&self, ticket: &Generation) -> bool {
        !ticket.cancel.is_cancelled()
            && self
                .active
                .as_ref()
                .is_some_and(|a| a.card_id == ticket.card_id && a.generation == ticket.generation)
    }

    fn require_selected(&self, state: CardState, action: &'static str) -> Result<usize, SessionError> {
        let card = self.selected_card().ok_or(SessionError::NoCards)?;
        if card.state != state {
            return Err(SessionError::InvalidState { card: card.id, state: card.state, action });
        }
        Ok(self.selected)
    }

    fn card_mut_at(&mut self, card_id: CardId, generation: u64, state: CardState) -> Option<&mut Card> {
        self.cards
            .iter_mut()
            .find(|c| c.id == card_id && c.generation == generation && c.state == state)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
