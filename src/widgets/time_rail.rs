//! Time rail: hour labels at the left of the grid plus the live drag readout.

use std::sync::{Arc, Mutex, Weak};

use super::context::CalendarContext;
use crate::core::{HoverChanged, ScrollElement, ScrollMount, ScrollRegion, ScrollSyncManager, Subscription};
use crate::schedule::snap;
use crate::time::HourTime;

/// Scroll key of the rail.
pub const TIME_RAIL_KEY: &str = "time_column";

/// Live label shown next to the rail while dragging over a day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeReadout {
    pub time: HourTime,
    /// Screen-space y of the alignment line
    pub top: f32,
}

pub struct TimeRail {
    region: Arc<ScrollRegion>,
    mount: Arc<ScrollMount>,
    scroll: Weak<ScrollSyncManager>,
    readout: Arc<Mutex<Option<TimeReadout>>>,
    subscription: Option<Subscription>,
}

impl std::fmt::Debug for TimeRail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeRail")
            .field("scroll_top", &self.region.scroll_top())
            .field("readout", &self.readout())
            .finish()
    }
}

impl TimeRail {
    pub fn mount(ctx: &CalendarContext, viewport_height: f32) -> Self {
        let region = Arc::new(ScrollRegion::new(viewport_height, ctx.config.content_height()));
        let mount = Arc::new(ScrollMount::with_element(region.clone()));
        ctx.scroll.register(TIME_RAIL_KEY, &mount);

        let manager = Arc::downgrade(&ctx.scroll);
        region.on_scroll(move |_| {
            if let Some(manager) = manager.upgrade() {
                manager.sync_from(TIME_RAIL_KEY);
            }
        });

        let readout = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&readout);
        let (hour_height, snap_minutes) = (ctx.config.hour_height, ctx.config.snap_minutes);
        let subscription = ctx.bus.subscribe::<HoverChanged, _>(move |e| {
            let state = &e.0;
            // Only real days get a readout, never the backlog
            let next = match (state.column_id.and_then(|c| c.date()), state.column_content_top, state.top_offset) {
                (Some(_), Some(content_top), Some(top)) => snap(content_top, hour_height, snap_minutes)
                    .to_hour_time()
                    .ok()
                    .map(|time| TimeReadout { time, top }),
                _ => None,
            };
            *slot.lock().unwrap_or_else(|e| e.into_inner()) = next;
        });

        Self {
            region,
            mount,
            scroll: Arc::downgrade(&ctx.scroll),
            readout,
            subscription: Some(subscription),
        }
    }

    pub fn unmount(&mut self) {
        self.subscription = None;
        self.region.clear_listener();
        self.mount.detach();
        if let Some(manager) = self.scroll.upgrade() {
            manager.unregister(TIME_RAIL_KEY);
        }
        *self.readout.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn region(&self) -> &Arc<ScrollRegion> {
        &self.region
    }

    pub fn scroll_top(&self) -> f32 {
        self.region.scroll_top()
    }

    pub fn readout(&self) -> Option<TimeReadout> {
        *self.readout.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// "12 AM", "1 AM" .. "11 PM".
    pub fn hour_labels(&self) -> Vec<String> {
        (0..24)
            .filter_map(|h| HourTime::new(h, 0).ok())
            .map(|t| t.hour12_with_suffix())
            .collect()
    }
}

impl Drop for TimeRail {
    fn drop(&mut self) {
        self.unmount();
    }
}
