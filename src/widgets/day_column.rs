//! Day column: one calendar day, scroll-synced, a drop target for timed drops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::NaiveDate;
use log::{debug, info, warn};

use super::context::{CalendarContext, ScheduleRequest};
use crate::core::{
    ColumnId, DropCommitted, HoverChanged, HoveredColumnState, ScheduleNotice, ScrollElement, ScrollMount,
    ScrollRegion, ScrollSyncManager, Subscription,
};
use crate::entities::{Board, ItemRef};
use crate::schedule::{DropPlanner, DropRejection, seconds_to_offset};
use crate::time::{CalendarDate, HourTime};

/// Where an item renders inside the column's content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub item: ItemRef,
    /// Content-space top, pixels
    pub top: f32,
    pub height: f32,
    pub time: HourTime,
}

pub struct DayColumn {
    date: CalendarDate,
    column: ColumnId,
    hour_height: f32,
    header_height: f32,
    hovered: Arc<AtomicBool>,
    region: Arc<ScrollRegion>,
    mount: Arc<ScrollMount>,
    scroll: Weak<ScrollSyncManager>,
    subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for DayColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DayColumn")
            .field("date", &self.column)
            .field("hovered", &self.is_hovered())
            .field("scroll_top", &self.region.scroll_top())
            .finish()
    }
}

impl DayColumn {
    /// Register the column's scroll region and subscribe to hover and drop.
    pub fn mount(ctx: &CalendarContext, date: NaiveDate, viewport_height: f32) -> Self {
        let date = CalendarDate::in_zone(date, ctx.timezone);
        let column = ColumnId::Day(date.date());
        let key = column.key();

        let region = Arc::new(ScrollRegion::new(viewport_height, ctx.config.content_height()));
        let mount = Arc::new(ScrollMount::with_element(region.clone()));
        ctx.scroll.register(key.clone(), &mount);

        let manager = Arc::downgrade(&ctx.scroll);
        region.on_scroll(move |_| {
            if let Some(manager) = manager.upgrade() {
                manager.sync_from(&key);
            }
        });

        let hovered = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&hovered);
        let on_hover = ctx.bus.subscribe::<HoverChanged, _>(move |e| {
            flag.store(e.0.is_over(&column), Ordering::Relaxed);
        });

        let drop_ctx = ctx.clone();
        let drop_date = date.clone();
        let on_drop = ctx.bus.subscribe::<DropCommitted, _>(move |e| {
            if e.0.is_over(&column) {
                handle_drop(&drop_ctx, &drop_date, &e.0);
            }
        });

        debug!("Mounted day column {column}");
        Self {
            date,
            column,
            hour_height: ctx.config.hour_height,
            header_height: ctx.config.header_height,
            hovered,
            region,
            mount,
            scroll: Arc::downgrade(&ctx.scroll),
            subscriptions: vec![on_hover, on_drop],
        }
    }

    /// Drop subscriptions and the scroll registration. Idempotent.
    pub fn unmount(&mut self) {
        for sub in &mut self.subscriptions {
            sub.unsubscribe();
        }
        self.subscriptions.clear();
        self.region.clear_listener();
        self.mount.detach();
        if let Some(manager) = self.scroll.upgrade() {
            manager.unregister(&self.column.key());
        }
        self.hovered.store(false, Ordering::Relaxed);
    }

    pub fn date(&self) -> &CalendarDate {
        &self.date
    }

    pub fn column_id(&self) -> ColumnId {
        self.column
    }

    pub fn key(&self) -> String {
        self.column.key()
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered.load(Ordering::Relaxed)
    }

    pub fn region(&self) -> &Arc<ScrollRegion> {
        &self.region
    }

    pub fn scroll_top(&self) -> f32 {
        self.region.scroll_top()
    }

    /// Scheduled items starting on this day, with their content-space boxes.
    pub fn placements(&self, board: &Board) -> Vec<Placement> {
        let start = self.date.start_seconds();
        let mut placements: Vec<Placement> = board
            .time_blocks()
            .filter_map(|block| {
                let item = block.owner()?;
                let starts_at = block.starts_at?;
                if !self.date.contains(starts_at.timestamp()) {
                    return None;
                }
                let backlogged = match item {
                    ItemRef::Task(id) => board.task(id).is_none_or(|t| t.is_backlogged),
                    ItemRef::WorkSession(_) => false,
                };
                if backlogged {
                    return None;
                }
                Some(Placement {
                    item,
                    top: seconds_to_offset(starts_at.timestamp() - start, self.hour_height),
                    height: seconds_to_offset(block.duration, self.hour_height),
                    time: HourTime::from_datetime(&starts_at.with_timezone(&self.date.timezone())),
                })
            })
            .collect();
        placements.sort_by(|a, b| a.top.total_cmp(&b.top));
        placements
    }

    /// Snapped time and instant under a pointer `y` pixels below the column
    /// top, for "add task here". `None` over the header or past midnight.
    pub fn time_at(&self, ctx: &CalendarContext, y: f32) -> Option<(HourTime, i64)> {
        if y < self.header_height {
            return None;
        }
        let content_top = self.scroll_top() + y - self.header_height;
        DropPlanner::new(&ctx.config).resolve(&self.date, content_top).ok()
    }
}

impl Drop for DayColumn {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Drop onto a day: gate, snap, conflict check, then queue the schedule call.
fn handle_drop(ctx: &CalendarContext, date: &CalendarDate, state: &HoveredColumnState) {
    let Some(dragged) = ctx.dragged() else {
        debug!("Drop on {} with nothing dragged", date.key());
        return;
    };
    let item = dragged.item;
    let content_top = state.column_content_top.unwrap_or(0.0);
    let scheduled = ctx.board().scheduled_between(date.start_seconds(), date.end_seconds());

    let planner = DropPlanner::new(&ctx.config);
    match planner.plan(item, dragged.duration, date, content_top, &scheduled) {
        Ok(plan) => {
            info!("Dropped {item} on {} at {}", date.key(), plan.time.time24());
            ctx.enqueue(ScheduleRequest {
                item,
                schedule: Some(plan.schedule),
                column: ColumnId::Day(date.date()),
            });
        }
        Err(rejection) => {
            warn!("Drop of {item} on {} rejected: {rejection}", date.key());
            match rejection {
                DropRejection::Conflict { other, interval, .. } => {
                    ctx.bus.emit(ScheduleNotice::Overlap { item, other, interval });
                }
                DropRejection::BelowMinimumDuration { minimum, .. } => {
                    ctx.bus.emit(ScheduleNotice::TooShort { item, minimum });
                }
                DropRejection::NoColumn | DropRejection::OutOfRange { .. } => {}
            }
        }
    }
}
