use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn left_past_threshold_rejects_in_any_state() {
    for state in [CardState::FastComplete, CardState::DetailedComplete, CardState::FastResponding] {
        assert_eq!(resolve_swipe(-81.0, state), SwipeOutcome::Reject);
    }
}

#[test]
fn right_past_threshold_accepts_only_fast_complete() {
    assert_eq!(resolve_swipe(120.0, CardState::FastComplete), SwipeOutcome::Accept);
    assert_eq!(resolve_swipe(120.0, CardState::DetailedComplete), SwipeOutcome::SnapBack);
}

#[test]
fn at_or_below_threshold_snaps_back() {
    assert_eq!(resolve_swipe(80.0, CardState::FastComplete), SwipeOutcome::SnapBack);
    assert_eq!(resolve_swipe(-80.0, CardState::FastComplete), SwipeOutcome::SnapBack);
    assert_eq!(resolve_swipe(0.0, CardState::FastComplete), SwipeOutcome::SnapBack);
}

#[test]
fn tracker_follows_pointer_and_resets_on_release() {
    let mut drag = DragTracker::new();
    drag.start(300.0, false);
    drag.update(200.0);
    let preview = drag.preview(CardState::FastComplete);
    assert!(approx(preview.offset_x, -100.0));
    assert!(approx(preview.rotation_deg, -5.0));
    assert!(approx(preview.opacity, 0.875));
    assert_eq!(preview.outcome, SwipeOutcome::Reject);

    assert_eq!(drag.release(CardState::FastComplete), SwipeOutcome::Reject);
    assert_eq!(drag, DragTracker::default());
}

#[test]
fn preview_outcome_follows_card_state() {
    let mut drag = DragTracker::new();
    drag.start(0.0, false);
    drag.update(120.0);
    assert_eq!(drag.preview(CardState::FastComplete).outcome, SwipeOutcome::Accept);
    assert_eq!(drag.preview(CardState::DetailedComplete).outcome, SwipeOutcome::SnapBack);
    assert!(approx(drag.preview(CardState::DetailedComplete).rotation_deg, 6.0));
}

#[test]
fn blocked_drag_is_ignored() {
    let mut drag = DragTracker::new();
    drag.start(0.0, true);
    drag.update(500.0);
    let preview = drag.preview(CardState::FastComplete);
    assert!(approx(preview.offset_x, 0.0));
    assert!(approx(preview.opacity, 1.0));
    assert_eq!(preview.outcome, SwipeOutcome::SnapBack);
    assert_eq!(drag.release(CardState::FastComplete), SwipeOutcome::SnapBack);
}

#[test]
fn opacity_is_clamped() {
    let mut drag = DragTracker::new();
    drag.start(0.0, false);
    drag.update(2000.0);
    assert!(approx(drag.preview(CardState::FastComplete).opacity, 0.0));
}
