//! Shared calendar context - what every widget of one calendar view sees.
//!
//! Owned by `CalendarView` and handed to children by clone (all handles are
//! `Arc`s). Holds the single active-drag slot: a second drag cannot start
//! while one is in flight.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono_tz::Tz;
use log::debug;

use crate::config::CalendarConfig;
use crate::core::{ColumnId, EventBus, LayoutProvider, ScrollSyncManager};
use crate::entities::{Board, ItemRef, Schedule};
use crate::time::resolve_timezone;

/// The item being dragged, as captured at drag start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraggedItem {
    pub item: ItemRef,
    /// Block duration at drag start, seconds
    pub duration: i64,
}

/// A checked drop waiting for the schedule service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub item: ItemRef,
    /// `None` moves the item to the backlog
    pub schedule: Option<Schedule>,
    pub column: ColumnId,
}

#[derive(Clone)]
pub struct CalendarContext {
    pub config: Arc<CalendarConfig>,
    pub timezone: Tz,
    pub bus: EventBus,
    pub scroll: Arc<ScrollSyncManager>,
    pub layout: Arc<dyn LayoutProvider>,
    board: Arc<Mutex<Board>>,
    dragged: Arc<Mutex<Option<DraggedItem>>>,
    pending: Arc<Mutex<VecDeque<ScheduleRequest>>>,
}

impl std::fmt::Debug for CalendarContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarContext")
            .field("timezone", &self.timezone)
            .field("dragged", &self.dragged())
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl CalendarContext {
    pub fn new(config: CalendarConfig, layout: Arc<dyn LayoutProvider>, board: Board) -> Self {
        let timezone = resolve_timezone(&config.timezone);
        Self {
            config: Arc::new(config),
            timezone,
            bus: EventBus::new(),
            scroll: Arc::new(ScrollSyncManager::new()),
            layout,
            board: Arc::new(Mutex::new(board)),
            dragged: Arc::new(Mutex::new(None)),
            pending: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn board(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Active drag slot ===

    /// Claim the slot for `item`. False if another drag holds it.
    pub fn claim_drag(&self, item: ItemRef) -> bool {
        let duration = self.board().duration_of(item);
        let mut slot = self.dragged.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = *slot {
            debug!("Drag of {item} ignored, {} is already being dragged", current.item);
            return false;
        }
        *slot = Some(DraggedItem { item, duration });
        true
    }

    pub fn release_drag(&self) {
        *self.dragged.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn dragged(&self) -> Option<DraggedItem> {
        *self.dragged.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Pending schedule requests ===

    pub fn enqueue(&self, request: ScheduleRequest) {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).push_back(request);
    }

    pub fn take_pending(&self) -> Vec<ScheduleRequest> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).drain(..).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
