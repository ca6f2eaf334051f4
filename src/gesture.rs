//! Horizontal drag → swipe intent mapping for a card.
//!
//! Pure numeric logic: the view layer feeds pointer positions in and reads
//! the transform values and the final outcome back.

use serde::{Deserialize, Serialize};

use crate::session::CardState;

/// Distance a card must travel before release counts as a swipe.
pub const SWIPE_THRESHOLD_PX: f64 = 80.0;
/// Degrees of tilt per pixel of horizontal offset.
pub const ROTATION_PER_PX: f64 = 0.05;
/// Offset at which a card is fully transparent.
pub const FADE_DISTANCE_PX: f64 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeOutcome {
    /// Dragged left past the threshold.
    Reject,
    /// Dragged right past the threshold on a finished fast answer.
    Accept,
    SnapBack,
}

/// Map a released drag offset to an outcome.
#[must_use]
pub fn resolve_swipe(offset_x: f64, state: CardState) -> SwipeOutcome {
    if offset_x < -SWIPE_THRESHOLD_PX {
        SwipeOutcome::Reject
    } else if offset_x > SWIPE_THRESHOLD_PX && state == CardState::FastComplete {
        SwipeOutcome::Accept
    } else {
        SwipeOutcome::SnapBack
    }
}

/// Card transform during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DragPreview {
    pub offset_x: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    /// Outcome if the pointer were released now.
    pub outcome: SwipeOutcome,
}

/// Transient pointer state for one drag.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragTracker {
    origin_x: f64,
    offset_x: f64,
    dragging: bool,
}

impl DragTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a drag at `x`. Ignored while the card is loading or streaming.
    pub fn start(&mut self, x: f64, blocked: bool) {
        if blocked {
            return;
        }
        self.origin_x = x;
        self.offset_x = 0.0;
        self.dragging = true;
    }

    pub fn update(&mut self, x: f64) {
        if self.dragging {
            self.offset_x = x - self.origin_x;
        }
    }

    /// End the drag and reset to rest.
    pub fn release(&mut self, state: CardState) -> SwipeOutcome {
        if !self.dragging {
            return SwipeOutcome::SnapBack;
        }
        let outcome = resolve_swipe(self.offset_x, state);
        *self = Self::default();
        outcome
    }

    /// Where the card sits right now, and what releasing it here would do.
    #[must_use]
    pub fn preview(&self, state: CardState) -> DragPreview {
        DragPreview {
            offset_x: self.offset_x,
            rotation_deg: self.offset_x * ROTATION_PER_PX,
            opacity: (1.0 - self.offset_x.abs() / FADE_DISTANCE_PX).clamp(0.0, 1.0),
            outcome: resolve_swipe(self.offset_x, state),
        }
    }
}

#[cfg(test)]
#[path = "gesture_test.rs"]
mod tests;
