//! Core engine modules - events, scroll sync, drag gestures, geometry
//!
//! Host-agnostic: the rendering host feeds pointer and scroll input in and
//! renders the state these modules expose.

pub mod drag;
pub mod event_bus;
pub mod events;
pub mod geometry;
pub mod scroll_sync;

// Re-exports for convenience
pub use drag::{DragHandler, DragOutcome, DragState, PointerDragController, PointerId};
pub use event_bus::{EventBus, EventEmitter, Subscription, downcast_event};
pub use events::{DropCommitted, HoverChanged, ScheduleNotice};
pub use geometry::{ColumnId, DropTarget, HoveredColumnState, LayoutProvider, Rect, resolve_hover};
pub use scroll_sync::{ScrollElement, ScrollMount, ScrollRegion, ScrollSyncManager, ScrollTarget};
