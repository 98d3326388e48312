//! Pointer drag controller: distinguishes a click from a drag.
//!
//! Idle -> Armed on pointer-down, Armed -> Dragging once the pointer moves
//! strictly more than `threshold` pixels from the start point; the move that
//! crosses the threshold is delivered as the first drag-move. A release
//! while Armed is a click. The controller owns no visual state.

use glam::Vec2;
use log::trace;

pub type PointerId = u64;

pub const DEFAULT_DRAG_THRESHOLD: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Pointer released normally; the drop should be evaluated
    Released,
    /// Gesture aborted by the host; clean up without dropping
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Armed { pointer: PointerId, start: Vec2 },
    Dragging { pointer: PointerId, start: Vec2, last: Vec2 },
}

/// Gesture callbacks. All optional.
pub trait DragHandler {
    fn on_click(&mut self) {}

    /// `origin` is the pointer-down position.
    fn on_drag_start(&mut self, _origin: Vec2) {}

    /// `delta` is cumulative from the pointer-down position.
    fn on_drag_move(&mut self, _delta: Vec2, _pointer: Vec2) {}

    fn on_drag_end(&mut self, _pointer: Vec2, _outcome: DragOutcome) {}
}

#[derive(Debug, Clone)]
pub struct PointerDragController {
    state: DragState,
    threshold: f32,
}

impl Default for PointerDragController {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl PointerDragController {
    pub fn new(threshold: f32) -> Self {
        Self {
            state: DragState::Idle,
            threshold: threshold.max(0.0),
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Pointer currently captured, if any.
    pub fn captured(&self) -> Option<PointerId> {
        match self.state {
            DragState::Idle => None,
            DragState::Armed { pointer, .. } | DragState::Dragging { pointer, .. } => Some(pointer),
        }
    }

    /// Capture `pointer` and arm. Ignored unless Idle.
    pub fn pointer_down(&mut self, pointer: PointerId, pos: Vec2) -> bool {
        if self.state != DragState::Idle {
            return false;
        }
        self.state = DragState::Armed { pointer, start: pos };
        true
    }

    pub fn pointer_move<H: DragHandler + ?Sized>(&mut self, pointer: PointerId, pos: Vec2, handler: &mut H) {
        match self.state {
            DragState::Armed { pointer: p, start } if p == pointer => {
                if start.distance(pos) > self.threshold {
                    trace!("Drag threshold passed for pointer {pointer}");
                    self.state = DragState::Dragging { pointer, start, last: pos };
                    handler.on_drag_start(start);
                    handler.on_drag_move(pos - start, pos);
                }
            }
            DragState::Dragging { pointer: p, start, .. } if p == pointer => {
                self.state = DragState::Dragging { pointer, start, last: pos };
                handler.on_drag_move(pos - start, pos);
            }
            _ => {}
        }
    }

    pub fn pointer_up<H: DragHandler + ?Sized>(&mut self, pointer: PointerId, pos: Vec2, handler: &mut H) {
        match self.state {
            DragState::Armed { pointer: p, .. } if p == pointer => {
                self.state = DragState::Idle;
                handler.on_click();
            }
            DragState::Dragging { pointer: p, .. } if p == pointer => {
                self.state = DragState::Idle;
                handler.on_drag_end(pos, DragOutcome::Released);
            }
            _ => {}
        }
    }

    /// Host-initiated abort. Dragging ends with `Cancelled`, Armed just resets.
    pub fn pointer_cancel<H: DragHandler + ?Sized>(&mut self, pointer: PointerId, handler: &mut H) {
        match self.state {
            DragState::Armed { pointer: p, .. } if p == pointer => {
                self.state = DragState::Idle;
            }
            DragState::Dragging { pointer: p, last, .. } if p == pointer => {
                self.state = DragState::Idle;
                handler.on_drag_end(last, DragOutcome::Cancelled);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl DragHandler for Recorder {
        fn on_click(&mut self) {
            self.calls.push("click".into());
        }
        fn on_drag_start(&mut self, p: Vec2) {
            self.calls.push(format!("start {} {}", p.x, p.y));
        }
        fn on_drag_move(&mut self, d: Vec2, p: Vec2) {
            self.calls.push(format!("move {} {} {} {}", d.x, d.y, p.x, p.y));
        }
        fn on_drag_end(&mut self, _p: Vec2, outcome: DragOutcome) {
            self.calls.push(format!("end {outcome:?}"));
        }
    }

    #[test]
    fn test_below_threshold_is_click() {
        let mut c = PointerDragController::default();
        let mut r = Recorder::default();
        c.pointer_down(1, Vec2::new(10.0, 10.0));
        c.pointer_move(1, Vec2::new(13.0, 14.0), &mut r); // exactly 5px
        c.pointer_up(1, Vec2::new(13.0, 14.0), &mut r);
        assert_eq!(r.calls, vec!["click"]);
        assert_eq!(c.state(), DragState::Idle);
    }

    #[test]
    fn test_drag_sequence() {
        let mut c = PointerDragController::default();
        let mut r = Recorder::default();
        c.pointer_down(1, Vec2::new(0.0, 0.0));
        c.pointer_move(1, Vec2::new(0.0, 6.0), &mut r);
        assert!(c.is_dragging());
        c.pointer_move(1, Vec2::new(3.0, 20.0), &mut r);
        c.pointer_up(1, Vec2::new(3.0, 20.0), &mut r);
        assert_eq!(
            r.calls,
            vec!["start 0 0", "move 0 6 0 6", "move 3 20 3 20", "end Released"]
        );
        assert_eq!(c.captured(), None);
    }

    #[test]
    fn test_cancel() {
        let mut c = PointerDragController::default();
        let mut r = Recorder::default();

        c.pointer_down(1, Vec2::ZERO);
        c.pointer_cancel(1, &mut r);
        assert!(r.calls.is_empty());
        assert_eq!(c.state(), DragState::Idle);

        c.pointer_down(1, Vec2::ZERO);
        c.pointer_move(1, Vec2::new(10.0, 0.0), &mut r);
        c.pointer_cancel(1, &mut r);
        assert_eq!(r.calls, vec!["start 0 0", "move 10 0 10 0", "end Cancelled"]);
    }

    #[test]
    fn test_other_pointers_ignored() {
        let mut c = PointerDragController::new(2.0);
        let mut r = Recorder::default();
        assert!(c.pointer_down(1, Vec2::ZERO));
        assert!(!c.pointer_down(2, Vec2::ZERO));
        c.pointer_move(2, Vec2::new(50.0, 50.0), &mut r);
        c.pointer_up(2, Vec2::new(50.0, 50.0), &mut r);
        assert!(r.calls.is_empty());
        assert_eq!(c.captured(), Some(1));
    }
}
