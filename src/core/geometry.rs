//! Column geometry: which column the pointer is over, and where in its content.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entities::ItemRef;

/// Axis-aligned rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Edges inclusive.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }
}

/// A drop column: a calendar day or the backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnId {
    Day(NaiveDate),
    Backlog,
}

pub const BACKLOG_KEY: &str = "backlog-column";

impl ColumnId {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ColumnId::Day(date) => Some(*date),
            ColumnId::Backlog => None,
        }
    }

    /// Scroll-sync key of the column.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnId::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            ColumnId::Backlog => f.write_str(BACKLOG_KEY),
        }
    }
}

impl FromStr for ColumnId {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == BACKLOG_KEY {
            return Ok(ColumnId::Backlog);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(ColumnId::Day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTarget {
    pub column: ColumnId,
    pub rect: Rect,
}

impl DropTarget {
    pub fn new(column: ColumnId, rect: Rect) -> Self {
        Self { column, rect }
    }
}

/// Hover snapshot published on every drag move, and once more on drop.
///
/// All fields are `None` when the pointer is over no column.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HoveredColumnState {
    pub column_id: Option<ColumnId>,
    /// Right edge of the hovered column, for placing the ghost
    pub column_right: Option<f32>,
    /// Screen-space top of the ghost, clipped to the column top
    pub top_offset: Option<f32>,
    /// Ghost top in the column's content space (no header, scroll 0)
    pub column_content_top: Option<f32>,
}

impl HoveredColumnState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.column_id.is_none()
    }

    pub fn is_over(&self, column: &ColumnId) -> bool {
        self.column_id.as_ref() == Some(column)
    }
}

/// First target whose rect contains `pointer`, and the ghost position in it.
pub fn resolve_hover(
    targets: &[DropTarget],
    pointer: Vec2,
    cursor_offset_top: f32,
    header_height: f32,
    scroll_top: impl Fn(&ColumnId) -> f32,
) -> HoveredColumnState {
    let Some(target) = targets.iter().find(|t| t.rect.contains(pointer)) else {
        return HoveredColumnState::none();
    };
    let screen_top = target.rect.top.max(pointer.y - cursor_offset_top);
    HoveredColumnState {
        column_id: Some(target.column),
        column_right: Some(target.rect.right()),
        top_offset: Some(screen_top),
        column_content_top: Some(screen_top - header_height + scroll_top(&target.column)),
    }
}

/// Host geometry queries, the DOM's `getBoundingClientRect` equivalents.
pub trait LayoutProvider: Send + Sync {
    /// Every drop column currently laid out, in screen space.
    fn drop_targets(&self) -> Vec<DropTarget>;

    /// Screen rect of an item's rendered block.
    fn item_rect(&self, item: ItemRef) -> Option<Rect>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> ColumnId {
        ColumnId::Day(NaiveDate::from_ymd_opt(2026, 3, d).unwrap())
    }

    fn targets() -> Vec<DropTarget> {
        vec![
            DropTarget::new(ColumnId::Backlog, Rect::new(0.0, 0.0, 100.0, 800.0)),
            DropTarget::new(day(2), Rect::new(100.0, 0.0, 100.0, 800.0)),
            DropTarget::new(day(3), Rect::new(200.0, 0.0, 100.0, 800.0)),
        ]
    }

    #[test]
    fn test_column_keys() {
        assert_eq!(day(2).key(), "2026-03-02");
        assert_eq!(ColumnId::Backlog.key(), "backlog-column");
        assert_eq!("2026-03-02".parse::<ColumnId>().unwrap(), day(2));
        assert_eq!("backlog-column".parse::<ColumnId>().unwrap(), ColumnId::Backlog);
    }

    #[test]
    fn test_resolve_content_top() {
        let state = resolve_hover(&targets(), Vec2::new(150.0, 175.0), 10.0, 40.0, |_| 1300.0);
        assert_eq!(state.column_id, Some(day(2)));
        assert_eq!(state.column_right, Some(200.0));
        assert_eq!(state.top_offset, Some(165.0));
        assert_eq!(state.column_content_top, Some(1425.0));
    }

    #[test]
    fn test_top_clipped_to_column() {
        let state = resolve_hover(&targets(), Vec2::new(250.0, 5.0), 30.0, 40.0, |_| 0.0);
        assert_eq!(state.top_offset, Some(0.0));
        assert_eq!(state.column_content_top, Some(-40.0));
    }

    #[test]
    fn test_edges_inclusive_first_match_wins() {
        // x = 100 is on both backlog's right edge and day 2's left edge
        let state = resolve_hover(&targets(), Vec2::new(100.0, 50.0), 0.0, 0.0, |_| 0.0);
        assert!(state.is_over(&ColumnId::Backlog));
    }

    #[test]
    fn test_outside_everything() {
        let state = resolve_hover(&targets(), Vec2::new(500.0, 50.0), 0.0, 40.0, |_| 0.0);
        assert!(state.is_none());
        assert_eq!(state, HoveredColumnState::none());
    }
}
