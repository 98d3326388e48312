//! Backlog column: unscheduled tasks. Dropping here clears an item's start.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use super::context::{CalendarContext, ScheduleRequest};
use crate::core::{ColumnId, DropCommitted, HoverChanged, Subscription};
use crate::entities::{Board, ItemRef};

#[derive(Debug)]
pub struct BacklogColumn {
    hovered: Arc<AtomicBool>,
    subscriptions: Vec<Subscription>,
}

impl BacklogColumn {
    pub fn mount(ctx: &CalendarContext) -> Self {
        let hovered = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&hovered);
        let on_hover = ctx.bus.subscribe::<HoverChanged, _>(move |e| {
            flag.store(e.0.is_over(&ColumnId::Backlog), Ordering::Relaxed);
        });

        let drop_ctx = ctx.clone();
        let on_drop = ctx.bus.subscribe::<DropCommitted, _>(move |e| {
            if !e.0.is_over(&ColumnId::Backlog) {
                return;
            }
            let Some(dragged) = drop_ctx.dragged() else {
                debug!("Drop on backlog with nothing dragged");
                return;
            };
            info!("Dropped {} on the backlog", dragged.item);
            drop_ctx.enqueue(ScheduleRequest {
                item: dragged.item,
                schedule: None,
                column: ColumnId::Backlog,
            });
        });

        Self {
            hovered,
            subscriptions: vec![on_hover, on_drop],
        }
    }

    pub fn unmount(&mut self) {
        for sub in &mut self.subscriptions {
            sub.unsubscribe();
        }
        self.subscriptions.clear();
        self.hovered.store(false, Ordering::Relaxed);
    }

    pub fn column_id(&self) -> ColumnId {
        ColumnId::Backlog
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered.load(Ordering::Relaxed)
    }

    /// Tasks listed in the backlog, in board order.
    pub fn items(&self, board: &Board) -> Vec<ItemRef> {
        board.backlog().into_iter().map(|t| ItemRef::Task(t.id)).collect()
    }
}

impl Drop for BacklogColumn {
    fn drop(&mut self) {
        self.unmount();
    }
}
