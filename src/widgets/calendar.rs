//! Calendar view - root coordinator of the day grid.
//!
//! Owns the context (and with it the active-drag slot), the time rail, the
//! backlog and one column per visible day. The host drives it:
//! - pointer input goes to `TaskBlock`s created with `task_block()`
//! - once per frame: `next_frame()`, then `process_pending()` and `poll_notices()`

use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use log::{debug, error, info};

use super::backlog::BacklogColumn;
use super::context::{CalendarContext, ScheduleRequest};
use super::day_column::DayColumn;
use super::task_block::TaskBlock;
use super::time_rail::{TIME_RAIL_KEY, TimeRail};
use crate::config::CalendarConfig;
use crate::core::{LayoutProvider, ScheduleNotice, ScrollElement, downcast_event};
use crate::entities::{Board, ItemRef};
use crate::service::{ScheduleService, ScheduleUpdate, ServiceError};

pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 800.0;

pub struct CalendarView {
    ctx: CalendarContext,
    service: Arc<dyn ScheduleService>,
    time_rail: TimeRail,
    backlog: BacklogColumn,
    columns: IndexMap<NaiveDate, DayColumn>,
    viewport_height: f32,
}

impl std::fmt::Debug for CalendarView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarView")
            .field("dates", &self.dates())
            .field("ctx", &self.ctx)
            .finish()
    }
}

impl CalendarView {
    pub fn new(
        config: CalendarConfig,
        layout: Arc<dyn LayoutProvider>,
        service: Arc<dyn ScheduleService>,
        board: Board,
    ) -> Self {
        let ctx = CalendarContext::new(config, layout, board);
        let time_rail = TimeRail::mount(&ctx, DEFAULT_VIEWPORT_HEIGHT);
        let backlog = BacklogColumn::mount(&ctx);
        Self {
            ctx,
            service,
            time_rail,
            backlog,
            columns: IndexMap::new(),
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }

    pub fn context(&self) -> &CalendarContext {
        &self.ctx
    }

    pub fn time_rail(&self) -> &TimeRail {
        &self.time_rail
    }

    pub fn backlog(&self) -> &BacklogColumn {
        &self.backlog
    }

    pub fn column(&self, date: NaiveDate) -> Option<&DayColumn> {
        self.columns.get(&date)
    }

    pub fn columns(&self) -> impl Iterator<Item = &DayColumn> {
        self.columns.values()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.columns.keys().copied().collect()
    }

    /// Show `dates`, left to right.
    ///
    /// Columns that stay keep their state; the rest are unmounted. Scroll
    /// relations are rebuilt so every day follows every other day and the
    /// rail, and the rail follows every day.
    pub fn set_date_range(&mut self, dates: &[NaiveDate]) {
        let mut previous = std::mem::take(&mut self.columns);
        let top = self.time_rail.scroll_top();

        for &date in dates {
            let column = previous.shift_remove(&date).unwrap_or_else(|| {
                let column = DayColumn::mount(&self.ctx, date, self.viewport_height);
                // Line up with the rest of the grid before any listener can fire
                column.region().scroll_to(top);
                column
            });
            self.columns.insert(date, column);
        }
        // Dropping unmounts
        drop(previous);

        let scroll = &self.ctx.scroll;
        let keys: Vec<String> = self.columns.values().map(DayColumn::key).collect();
        scroll.clear_relations(TIME_RAIL_KEY);
        for key in &keys {
            scroll.clear_relations(key);
            scroll.relate(key, keys.iter().filter(|k| *k != key).cloned());
            scroll.relate(key, [TIME_RAIL_KEY]);
            scroll.relate(TIME_RAIL_KEY, [key.clone()]);
        }
        debug!("Date range set: {:?}", keys);
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height;
        self.time_rail.region().set_viewport_height(height);
        for column in self.columns.values() {
            column.region().set_viewport_height(height);
        }
    }

    /// A draggable block for `item`, bound to this view.
    pub fn task_block(&self, item: ItemRef) -> TaskBlock {
        TaskBlock::new(&self.ctx, item)
    }

    /// Frame boundary: releases the scroll-sync guard.
    pub fn next_frame(&self) {
        self.ctx.scroll.next_frame();
    }

    /// Send queued drops to the schedule service, one call each, no retry.
    /// The board is only updated for calls that succeed.
    pub fn process_pending(&self) -> Vec<Result<ScheduleUpdate, ServiceError>> {
        self.ctx
            .take_pending()
            .into_iter()
            .map(|request| self.commit(request))
            .collect()
    }

    fn commit(&self, request: ScheduleRequest) -> Result<ScheduleUpdate, ServiceError> {
        let ScheduleRequest { item, schedule, column } = request;
        match self.service.update_schedule(item, schedule) {
            Ok(update) => {
                self.ctx.board().apply_update(&update);
                info!("Saved {item} in {column}");
                let notice = if schedule.is_some() {
                    ScheduleNotice::Scheduled { item }
                } else {
                    ScheduleNotice::Backlogged { item }
                };
                self.ctx.bus.emit(notice);
                Ok(update)
            }
            Err(e) => {
                error!("Failed to save {item} in {column}: {e}");
                self.ctx.bus.emit(ScheduleNotice::SaveFailed {
                    item,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Notices since the last call, oldest first.
    pub fn poll_notices(&self) -> Vec<ScheduleNotice> {
        self.ctx
            .bus
            .poll()
            .iter()
            .filter_map(|event| downcast_event::<ScheduleNotice>(event).cloned())
            .collect()
    }

    pub fn board(&self) -> Board {
        self.ctx.board().clone()
    }

    /// Swap in a freshly loaded board.
    pub fn replace_board(&self, board: Board) {
        *self.ctx.board() = board;
    }
}
