//! Task block: a draggable item on the grid or in the backlog.
//!
//! Drag lifecycle:
//! - start: claim the drag slot, snapshot drop-target rects, show the ghost
//!   and mark the original as a skeleton
//! - move: resolve the hovered column and publish `HoverChanged`
//! - release: reset highlights, then publish `DropCommitted` once with the
//!   final state
//! - cancel: clean up only
//!
//! Drop targets are measured once at drag start. A layout shift during the
//! drag (scroll-triggered reflow) is not picked up until the next drag.

use glam::Vec2;
use log::debug;

use super::context::CalendarContext;
use crate::core::{
    DragHandler, DragOutcome, DragState, DropCommitted, DropTarget, HoverChanged, HoveredColumnState,
    PointerDragController, PointerId, Rect, resolve_hover,
};
use crate::entities::ItemRef;
use crate::schedule::DropRejection;

/// Floating copy of the block that follows the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    pub rect: Rect,
}

#[derive(Debug, Clone)]
struct DragSession {
    origin: Rect,
    /// Pointer y minus block top at drag start
    cursor_offset_top: f32,
    targets: Vec<DropTarget>,
    ghost: Ghost,
    last: HoveredColumnState,
}

/// Drag callbacks of one task block.
#[derive(Debug)]
pub struct TaskDrag {
    ctx: CalendarContext,
    item: ItemRef,
    session: Option<DragSession>,
    clicks: usize,
}

impl TaskDrag {
    pub fn new(ctx: CalendarContext, item: ItemRef) -> Self {
        Self {
            ctx,
            item,
            session: None,
            clicks: 0,
        }
    }

    fn hover_at(&self, session: &DragSession, pointer: Vec2) -> HoveredColumnState {
        let header_height = self.ctx.config.header_height;
        resolve_hover(&session.targets, pointer, session.cursor_offset_top, header_height, |column| {
            self.ctx.scroll.scroll_top(&column.key()).unwrap_or(0.0)
        })
    }

    fn cleanup(&mut self) {
        if self.session.take().is_some() {
            // Reset every column's highlight
            self.ctx.bus.publish(HoverChanged(HoveredColumnState::none()));
            self.ctx.release_drag();
        }
    }
}

impl DragHandler for TaskDrag {
    fn on_click(&mut self) {
        self.clicks += 1;
    }

    fn on_drag_start(&mut self, origin_pointer: Vec2) {
        if !self.ctx.claim_drag(self.item) {
            return;
        }
        let origin = self
            .ctx
            .layout
            .item_rect(self.item)
            .unwrap_or_else(|| Rect::new(origin_pointer.x, origin_pointer.y, 0.0, 0.0));
        let targets = self.ctx.layout.drop_targets();
        debug!("Drag of {} started, {} drop targets", self.item, targets.len());

        self.session = Some(DragSession {
            origin,
            cursor_offset_top: origin_pointer.y - origin.top,
            targets,
            ghost: Ghost { rect: origin },
            last: HoveredColumnState::none(),
        });
    }

    fn on_drag_move(&mut self, delta: Vec2, pointer: Vec2) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let state = self.hover_at(session, pointer);

        let mut ghost = session.origin;
        ghost.left += delta.x;
        ghost.top += delta.y;
        if let (Some(right), Some(top)) = (state.column_right, state.top_offset) {
            // Snap to the hovered column
            ghost.left = right - ghost.width;
            ghost.top = top;
        }

        if let Some(session) = self.session.as_mut() {
            session.ghost = Ghost { rect: ghost };
            session.last = state;
        }
        self.ctx.bus.publish(HoverChanged(state));
    }

    fn on_drag_end(&mut self, pointer: Vec2, outcome: DragOutcome) {
        let Some(session) = self.session.take() else {
            return;
        };
        // Highlights reset first: the drop is the last event of the gesture
        self.ctx.bus.publish(HoverChanged(HoveredColumnState::none()));
        if outcome == DragOutcome::Released {
            let state = self.hover_at(&session, pointer);
            if state.is_none() {
                debug!("Drag of {} ended: {}", self.item, DropRejection::NoColumn);
            }
            self.ctx.bus.publish(DropCommitted(state));
        } else {
            debug!("Drag of {} cancelled", self.item);
        }
        self.ctx.release_drag();
    }
}

/// A rendered item with its own drag controller.
#[derive(Debug)]
pub struct TaskBlock {
    controller: PointerDragController,
    drag: TaskDrag,
}

impl TaskBlock {
    pub fn new(ctx: &CalendarContext, item: ItemRef) -> Self {
        Self {
            controller: PointerDragController::new(ctx.config.drag_threshold),
            drag: TaskDrag::new(ctx.clone(), item),
        }
    }

    pub fn item(&self) -> ItemRef {
        self.drag.item
    }

    pub fn pointer_down(&mut self, pointer: PointerId, pos: Vec2) -> bool {
        // Another block is mid-drag: ignore the gesture entirely
        if self.drag.ctx.dragged().is_some() {
            return false;
        }
        self.controller.pointer_down(pointer, pos)
    }

    pub fn pointer_move(&mut self, pointer: PointerId, pos: Vec2) {
        self.controller.pointer_move(pointer, pos, &mut self.drag);
    }

    pub fn pointer_up(&mut self, pointer: PointerId, pos: Vec2) {
        self.controller.pointer_up(pointer, pos, &mut self.drag);
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId) {
        self.controller.pointer_cancel(pointer, &mut self.drag);
    }

    pub fn state(&self) -> DragState {
        self.controller.state()
    }

    /// True while this block owns the active drag.
    pub fn is_dragging(&self) -> bool {
        self.drag.session.is_some()
    }

    /// Original block is greyed out while its ghost is in flight.
    pub fn is_skeleton(&self) -> bool {
        self.is_dragging()
    }

    pub fn ghost(&self) -> Option<Ghost> {
        self.drag.session.as_ref().map(|s| s.ghost)
    }

    pub fn hover_state(&self) -> Option<HoveredColumnState> {
        self.drag.session.as_ref().map(|s| s.last)
    }

    /// Clicks since the last call; the host opens the item editor on these.
    pub fn take_clicks(&mut self) -> usize {
        std::mem::take(&mut self.drag.clicks)
    }
}

impl Drop for TaskBlock {
    fn drop(&mut self) {
        // Unmounted mid-drag: free the slot without dropping
        self.drag.cleanup();
    }
}
