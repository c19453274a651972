//! Drag-selection bookkeeping for the screenshot overlay.
//!
//! Coordinates are logical points relative to the overlay. Nothing in here
//! touches a window, so the whole interaction can be driven from tests.

use egui::{Pos2, Rect, Vec2};

/// Selections narrower or shorter than this are treated as accidental clicks.
pub const MIN_SELECTION_SIZE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionOutcome {
    Selected(Rect),
    TooSmall(Rect),
    NotSelecting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Reposition {
    grab: Pos2,
    origin: Pos2,
    delta: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    anchor: Pos2,
    rect: Rect,
    reposition: Option<Reposition>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Phase {
    #[default]
    Idle,
    Dragging(Drag),
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SelectionState {
    phase: Phase,
}

impl SelectionState {
    pub fn press(&mut self, pos: Pos2) {
        self.phase = Phase::Dragging(Drag {
            anchor: pos,
            rect: Rect::from_min_size(pos, Vec2::splat(1.0)),
            reposition: None,
        });
    }

    pub fn pointer_moved(&mut self, pos: Pos2, shift_held: bool) {
        let Phase::Dragging(drag) = &mut self.phase else {
            return;
        };

        if shift_held {
            let reposition = drag.reposition.get_or_insert(Reposition {
                grab: pos,
                origin: drag.rect.min,
                delta: Vec2::ZERO,
            });
            reposition.delta = pos - reposition.grab;

            let size = drag.rect.size();
            drag.rect = Rect::from_min_size(reposition.origin + reposition.delta, size);
            return;
        }

        drag.end_reposition();
        drag.rect = Rect::from_two_pos(drag.anchor, pos);
    }

    pub fn shift_released(&mut self) {
        if let Phase::Dragging(drag) = &mut self.phase {
            drag.end_reposition();
        }
    }

    pub fn release(&mut self, pos: Pos2, shift_held: bool) -> SelectionOutcome {
        self.pointer_moved(pos, shift_held);
        self.finish()
    }

    /// Ends the drag with the rectangle as it stands, for releases that
    /// arrive without a pointer position.
    pub fn finish(&mut self) -> SelectionOutcome {
        let Phase::Dragging(drag) = std::mem::take(&mut self.phase) else {
            return SelectionOutcome::NotSelecting;
        };

        let rect = drag.rect;
        if rect.width() < MIN_SELECTION_SIZE || rect.height() < MIN_SELECTION_SIZE {
            SelectionOutcome::TooSmall(rect)
        } else {
            SelectionOutcome::Selected(rect)
        }
    }

    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn rect(&self) -> Option<Rect> {
        match &self.phase {
            Phase::Dragging(drag) => Some(drag.rect),
            Phase::Idle => None,
        }
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.phase, Phase::Dragging(_))
    }

    pub fn is_repositioning(&self) -> bool {
        matches!(
            self.phase,
            Phase::Dragging(Drag {
                reposition: Some(_),
                ..
            })
        )
    }
}

impl Drag {
    /// Carries the shift offset over to the anchor so the next resize
    /// continues from where the rectangle was moved to.
    fn end_reposition(&mut self) {
        if let Some(reposition) = self.reposition.take() {
            self.anchor += reposition.delta;
        }
    }
}

/// Rectangles covering `screen` except for `selection`.
///
/// The overlay fills these with the dimming colour, which leaves a clear hole
/// over the selected area. Empty bands are skipped.
pub fn dim_regions(screen: Rect, selection: Option<Rect>) -> Vec<Rect> {
    let Some(selection) = selection else {
        return vec![screen];
    };

    let hole = selection.intersect(screen);
    if !hole.is_positive() {
        return vec![screen];
    }

    [
        Rect::from_min_max(screen.min, Pos2::new(screen.max.x, hole.min.y)),
        Rect::from_min_max(Pos2::new(screen.min.x, hole.max.y), screen.max),
        Rect::from_min_max(
            Pos2::new(screen.min.x, hole.min.y),
            Pos2::new(hole.min.x, hole.max.y),
        ),
        Rect::from_min_max(
            Pos2::new(hole.max.x, hole.min.y),
            Pos2::new(screen.max.x, hole.max.y),
        ),
    ]
    .into_iter()
    .filter(Rect::is_positive)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn dragged(from: Pos2, to: Pos2) -> SelectionState {
        let mut state = SelectionState::default();
        state.press(from);
        state.pointer_moved(to, false);
        state
    }

    #[test]
    fn press_starts_one_point_selection() {
        let mut state = SelectionState::default();
        assert!(!state.is_selecting());

        state.press(pos2(50.0, 60.0));

        assert!(state.is_selecting());
        assert_eq!(
            state.rect(),
            Some(Rect::from_min_size(pos2(50.0, 60.0), Vec2::splat(1.0)))
        );
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut state = SelectionState::default();
        state.pointer_moved(pos2(10.0, 10.0), false);
        state.pointer_moved(pos2(20.0, 20.0), true);

        assert_eq!(state.rect(), None);
        assert!(!state.is_repositioning());
    }

    #[test]
    fn drag_is_normalised_in_every_direction() {
        let state = dragged(pos2(100.0, 100.0), pos2(40.0, 160.0));
        assert_eq!(
            state.rect(),
            Some(Rect::from_min_max(pos2(40.0, 100.0), pos2(100.0, 160.0)))
        );

        let state = dragged(pos2(100.0, 100.0), pos2(30.0, 20.0));
        assert_eq!(
            state.rect(),
            Some(Rect::from_min_max(pos2(30.0, 20.0), pos2(100.0, 100.0)))
        );
    }

    #[test]
    fn shift_moves_without_resizing() {
        let mut state = dragged(pos2(10.0, 10.0), pos2(110.0, 60.0));

        state.pointer_moved(pos2(110.0, 60.0), true);
        assert!(state.is_repositioning());
        state.pointer_moved(pos2(130.0, 90.0), true);

        let rect = state.rect().unwrap();
        assert_eq!(rect.min, pos2(30.0, 40.0));
        assert_eq!(rect.size(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn resize_after_shift_continues_from_moved_anchor() {
        let mut state = dragged(pos2(10.0, 10.0), pos2(110.0, 60.0));
        state.pointer_moved(pos2(110.0, 60.0), true);
        state.pointer_moved(pos2(130.0, 90.0), true);
        state.shift_released();
        assert!(!state.is_repositioning());

        state.pointer_moved(pos2(150.0, 100.0), false);

        assert_eq!(
            state.rect(),
            Some(Rect::from_min_max(pos2(30.0, 40.0), pos2(150.0, 100.0)))
        );
    }

    #[test]
    fn reposition_delta_is_applied_once() {
        let mut state = dragged(pos2(0.0, 0.0), pos2(50.0, 50.0));
        state.pointer_moved(pos2(50.0, 50.0), true);
        state.pointer_moved(pos2(60.0, 50.0), true);
        state.shift_released();
        state.shift_released();
        // Shift let go between frames without a key-up event.
        state.pointer_moved(pos2(60.0, 50.0), false);

        assert_eq!(
            state.rect(),
            Some(Rect::from_min_max(pos2(10.0, 0.0), pos2(60.0, 50.0)))
        );
    }

    #[test]
    fn second_shift_session_starts_from_current_rect() {
        let mut state = dragged(pos2(0.0, 0.0), pos2(40.0, 40.0));
        state.pointer_moved(pos2(40.0, 40.0), true);
        state.pointer_moved(pos2(50.0, 40.0), true);
        state.shift_released();

        state.pointer_moved(pos2(50.0, 40.0), true);
        state.pointer_moved(pos2(50.0, 70.0), true);

        let rect = state.rect().unwrap();
        assert_eq!(rect.min, pos2(10.0, 30.0));
        assert_eq!(rect.size(), Vec2::new(40.0, 40.0));
    }

    #[test]
    fn release_returns_selection_and_resets() {
        let mut state = SelectionState::default();
        state.press(pos2(10.0, 20.0));

        let outcome = state.release(pos2(210.0, 120.0), false);

        assert_eq!(
            outcome,
            SelectionOutcome::Selected(Rect::from_min_max(pos2(10.0, 20.0), pos2(210.0, 120.0)))
        );
        assert!(!state.is_selecting());
    }

    #[test]
    fn release_below_minimum_is_too_small() {
        let mut state = SelectionState::default();
        state.press(pos2(10.0, 10.0));
        assert!(matches!(
            state.release(pos2(300.0, 19.0), false),
            SelectionOutcome::TooSmall(_)
        ));

        state.press(pos2(10.0, 10.0));
        assert!(matches!(
            state.release(pos2(19.9, 300.0), false),
            SelectionOutcome::TooSmall(_)
        ));

        state.press(pos2(10.0, 10.0));
        assert!(matches!(
            state.release(pos2(20.0, 20.0), false),
            SelectionOutcome::Selected(_)
        ));
    }

    #[test]
    fn release_while_repositioning_keeps_size() {
        let mut state = dragged(pos2(0.0, 0.0), pos2(100.0, 100.0));
        state.pointer_moved(pos2(100.0, 100.0), true);

        let outcome = state.release(pos2(300.0, 100.0), true);

        assert_eq!(
            outcome,
            SelectionOutcome::Selected(Rect::from_min_max(pos2(200.0, 0.0), pos2(300.0, 100.0)))
        );
    }

    #[test]
    fn release_when_idle_is_not_selecting() {
        let mut state = SelectionState::default();
        assert_eq!(
            state.release(pos2(1.0, 1.0), false),
            SelectionOutcome::NotSelecting
        );
        assert_eq!(state.finish(), SelectionOutcome::NotSelecting);
    }

    #[test]
    fn finish_keeps_current_rect() {
        let mut state = dragged(pos2(100.0, 100.0), pos2(20.0, 40.0));

        assert_eq!(
            state.finish(),
            SelectionOutcome::Selected(Rect::from_min_max(pos2(20.0, 40.0), pos2(100.0, 100.0)))
        );
        assert!(!state.is_selecting());

        state.press(pos2(5.0, 5.0));
        assert!(matches!(state.finish(), SelectionOutcome::TooSmall(_)));
    }

    #[test]
    fn cancel_drops_selection() {
        let mut state = dragged(pos2(0.0, 0.0), pos2(100.0, 100.0));
        state.cancel();

        assert!(!state.is_selecting());
        assert_eq!(state.rect(), None);
    }

    #[test]
    fn dim_regions_without_selection_cover_screen() {
        let screen = Rect::from_min_size(Pos2::ZERO, Vec2::new(1920.0, 1080.0));
        assert_eq!(dim_regions(screen, None), vec![screen]);
    }

    #[test]
    fn dim_regions_leave_a_hole() {
        let screen = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 100.0));
        let selection = Rect::from_min_max(pos2(20.0, 30.0), pos2(60.0, 70.0));

        let regions = dim_regions(screen, Some(selection));

        assert_eq!(regions.len(), 4);
        let covered: f32 = regions.iter().map(|r| r.area()).sum();
        assert_eq!(covered, screen.area() - selection.area());
        assert!(regions.iter().all(|r| !r.intersects(selection.shrink(0.5))));
    }

    #[test]
    fn dim_regions_skip_empty_bands() {
        let screen = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 100.0));
        let selection = Rect::from_min_max(pos2(0.0, 0.0), pos2(50.0, 100.0));

        let regions = dim_regions(screen, Some(selection));

        assert_eq!(
            regions,
            vec![Rect::from_min_max(pos2(50.0, 0.0), pos2(100.0, 100.0))]
        );
    }

    #[test]
    fn dim_regions_clip_selection_to_screen() {
        let screen = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 100.0));
        let selection = Rect::from_min_max(pos2(80.0, -20.0), pos2(140.0, 40.0));

        let regions = dim_regions(screen, Some(selection));

        let covered: f32 = regions.iter().map(|r| r.area()).sum();
        assert_eq!(covered, screen.area() - 20.0 * 40.0);
    }
}
