//! End-to-end drag and drop through the calendar view.
//!
//! Screen layout used throughout:
//! - day column 2024-03-01 at x 100..200, y 0..800, scrolled to 1300
//! - backlog column at x 300..400
//! - header 40px, 100px per hour, 15 minute snap
//! - the dragged block is drawn at y 190, grabbed at y 200

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use glam::Vec2;

use daygrid::config::CalendarConfig;
use daygrid::core::{
    ColumnId, DragState, DropCommitted, DropTarget, HoverChanged, LayoutProvider, Rect, ScheduleNotice, ScrollElement,
};
use daygrid::entities::{Board, ItemRef, Schedule, Task, TimeBlock};
use daygrid::schedule::Interval;
use daygrid::service::{ScheduleService, ScheduleUpdate, ServiceError};
use daygrid::widgets::CalendarView;

const POINTER: u64 = 1;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

struct FakeLayout;

impl LayoutProvider for FakeLayout {
    fn drop_targets(&self) -> Vec<DropTarget> {
        vec![
            DropTarget::new(ColumnId::Day(day()), Rect::new(100.0, 0.0, 100.0, 800.0)),
            DropTarget::new(ColumnId::Backlog, Rect::new(300.0, 0.0, 100.0, 800.0)),
        ]
    }

    fn item_rect(&self, _item: ItemRef) -> Option<Rect> {
        Some(Rect::new(100.0, 190.0, 100.0, 50.0))
    }
}

#[derive(Default)]
struct RecordingService {
    calls: Mutex<Vec<(ItemRef, Option<Schedule>)>>,
    fail: bool,
}

impl RecordingService {
    fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    fn calls(&self) -> Vec<(ItemRef, Option<Schedule>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ScheduleService for RecordingService {
    fn update_schedule(&self, item: ItemRef, schedule: Option<Schedule>) -> Result<ScheduleUpdate, ServiceError> {
        self.calls.lock().unwrap().push((item, schedule));
        if self.fail {
            return Err(ServiceError::Unavailable("connection refused".into()));
        }
        let time_block = schedule.map(|s| TimeBlock::new(100 + item.id(), item, Some(s.starts_at), s.duration));
        Ok(ScheduleUpdate { item, time_block, task: None })
    }
}

/// Task 1 occupies 14:00-14:30. Task 2 (30 min) and task 3 (no block) are unscheduled.
fn board() -> Board {
    board_with_task_1_at(14)
}

/// Same items, but task 1 sits at 09:00 and the afternoon is free.
fn board_without_busy() -> Board {
    board_with_task_1_at(9)
}

fn board_with_task_1_at(hour: u32) -> Board {
    let busy = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
    Board::new(
        vec![Task::new(1, "standup"), Task::new(2, "write report"), Task::new(3, "inbox zero")],
        vec![],
        vec![
            TimeBlock::new(11, ItemRef::Task(1), Some(busy), 1800),
            TimeBlock::new(12, ItemRef::Task(2), None, 1800),
        ],
    )
}

fn view(service: Arc<RecordingService>) -> CalendarView {
    view_with(service, board())
}

fn view_with(service: Arc<RecordingService>, board: Board) -> CalendarView {
    let mut view = CalendarView::new(CalendarConfig::default(), Arc::new(FakeLayout), service, board);
    view.set_date_range(&[day()]);
    let column = view.column(day()).unwrap();
    column.region().scroll_to(1300.0);
    view.next_frame();
    view
}

/// Grab at (150, 200), drag to `to`, release there.
fn drag(view: &CalendarView, item: ItemRef, to: Vec2) {
    let mut block = view.task_block(item);
    assert!(block.pointer_down(POINTER, Vec2::new(150.0, 200.0)));
    block.pointer_move(POINTER, to);
    assert!(block.is_dragging());
    block.pointer_up(POINTER, to);
    assert!(!block.is_dragging());
}

#[test]
fn test_scroll_follows_into_time_rail() {
    let view = view(Arc::new(RecordingService::default()));
    assert_eq!(view.column(day()).unwrap().scroll_top(), 1300.0);
    assert_eq!(view.time_rail().scroll_top(), 1300.0);
}

#[test]
fn test_drop_schedules_at_snapped_time() {
    let service = Arc::new(RecordingService::default());
    let view = view_with(service.clone(), board_without_busy());
    let item = ItemRef::Task(2);

    drag(&view, item, Vec2::new(150.0, 175.0));
    assert_eq!(view.context().pending_len(), 1);
    // Nothing persisted before the frame processes the queue
    assert!(service.calls().is_empty());

    let results = view.process_pending();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());

    let start = Utc.with_ymd_and_hms(2024, 3, 1, 14, 15, 0).unwrap();
    assert_eq!(service.calls(), vec![(item, Some(Schedule::new(start, 1800)))]);
    assert_eq!(
        view.board().interval_of(item),
        Some(Interval::from_duration(start.timestamp(), 1800))
    );
    assert_eq!(view.poll_notices(), vec![ScheduleNotice::Scheduled { item }]);
    assert!(view.context().dragged().is_none());
}

#[test]
fn test_conflicting_drop_is_rejected() {
    let service = Arc::new(RecordingService::default());
    let view = view(service.clone());
    let item = ItemRef::Task(2);
    let before = view.board().time_block_for(item).cloned();

    // Task 1 already sits at 14:00-14:30; the drop lands at 14:15
    let mut block = view.task_block(item);
    block.pointer_down(POINTER, Vec2::new(150.0, 200.0));
    block.pointer_move(POINTER, Vec2::new(150.0, 175.0));
    assert!(block.ghost().is_some());
    block.pointer_up(POINTER, Vec2::new(150.0, 175.0));
    assert!(block.ghost().is_none());

    assert_eq!(view.context().pending_len(), 0);
    assert!(view.process_pending().is_empty());
    assert!(service.calls().is_empty());
    assert_eq!(view.board().time_block_for(item).cloned(), before);

    let busy = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap().timestamp();
    assert_eq!(
        view.poll_notices(),
        vec![ScheduleNotice::Overlap {
            item,
            other: ItemRef::Task(1),
            interval: Interval::from_duration(busy, 1800),
        }]
    );
}

#[test]
fn test_touching_drop_is_accepted() {
    let service = Arc::new(RecordingService::default());
    let view = view(service.clone());
    let item = ItemRef::Task(2);

    // Back to the grab point: content top 1450 is 14:30, where the busy block ends
    let mut block = view.task_block(item);
    block.pointer_down(POINTER, Vec2::new(150.0, 200.0));
    block.pointer_move(POINTER, Vec2::new(150.0, 230.0));
    block.pointer_move(POINTER, Vec2::new(150.0, 200.0));
    block.pointer_up(POINTER, Vec2::new(150.0, 200.0));
    view.process_pending();

    let start = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
    assert_eq!(service.calls(), vec![(item, Some(Schedule::new(start, 1800)))]);
}

#[test]
fn test_zero_duration_drop_hits_gate() {
    let service = Arc::new(RecordingService::default());
    let view = view(service.clone());
    let item = ItemRef::Task(3);

    drag(&view, item, Vec2::new(150.0, 400.0));

    assert_eq!(view.context().pending_len(), 0);
    assert!(view.process_pending().is_empty());
    assert!(service.calls().is_empty());
    assert_eq!(view.poll_notices(), vec![ScheduleNotice::TooShort { item, minimum: 900 }]);
}

#[test]
fn test_drop_on_backlog() {
    let service = Arc::new(RecordingService::default());
    let view = view(service.clone());
    let item = ItemRef::Task(1);

    drag(&view, item, Vec2::new(350.0, 300.0));
    view.process_pending();

    assert_eq!(service.calls(), vec![(item, None)]);
    assert_eq!(view.board().time_block_for(item), None);
    assert_eq!(view.poll_notices(), vec![ScheduleNotice::Backlogged { item }]);
}

#[test]
fn test_drop_outside_columns_does_nothing() {
    let service = Arc::new(RecordingService::default());
    let view = view(service.clone());

    drag(&view, ItemRef::Task(2), Vec2::new(600.0, 300.0));
    assert!(view.process_pending().is_empty());
    assert!(view.poll_notices().is_empty());
    assert!(view.context().dragged().is_none());
}

#[test]
fn test_failed_save_leaves_board_unchanged() {
    let service = Arc::new(RecordingService::failing());
    let view = view_with(service.clone(), board_without_busy());
    let item = ItemRef::Task(2);
    let before = view.board().time_block_for(item).cloned();

    drag(&view, item, Vec2::new(150.0, 175.0));
    assert_eq!(view.context().pending_len(), 1);
    let results = view.process_pending();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
    assert_eq!(view.board().time_block_for(item).cloned(), before);
    assert_eq!(service.calls().len(), 1);
    assert_eq!(view.board().time_block_for(item).and_then(|b| b.starts_at), None);
    assert!(matches!(
        view.poll_notices().as_slice(),
        [ScheduleNotice::SaveFailed { item: i, .. }] if *i == item
    ));
}

#[test]
fn test_hover_feedback_and_cancel() {
    let service = Arc::new(RecordingService::default());
    let view = view(service.clone());

    let mut block = view.task_block(ItemRef::Task(2));
    block.pointer_down(POINTER, Vec2::new(150.0, 200.0));
    block.pointer_move(POINTER, Vec2::new(150.0, 175.0));

    assert!(block.is_skeleton());
    assert!(view.column(day()).unwrap().is_hovered());
    assert!(!view.backlog().is_hovered());
    let readout = view.time_rail().readout().unwrap();
    assert_eq!(readout.time.time24(), "14:15");
    assert_eq!(readout.top, 165.0);
    // Ghost snaps to the hovered column
    assert_eq!(block.ghost().map(|g| (g.rect.left, g.rect.top)), Some((100.0, 165.0)));

    block.pointer_cancel(POINTER);
    assert_eq!(block.state(), DragState::Idle);
    assert!(block.ghost().is_none());
    assert!(!view.column(day()).unwrap().is_hovered());
    assert!(view.time_rail().readout().is_none());
    assert!(view.context().dragged().is_none());
    assert_eq!(view.context().pending_len(), 0);
    assert!(service.calls().is_empty());
}

#[test]
fn test_second_drag_is_ignored() {
    let view = view(Arc::new(RecordingService::default()));

    let mut first = view.task_block(ItemRef::Task(1));
    first.pointer_down(POINTER, Vec2::new(150.0, 200.0));
    first.pointer_move(POINTER, Vec2::new(150.0, 260.0));
    assert!(first.is_dragging());

    let mut second = view.task_block(ItemRef::Task(2));
    assert!(!second.pointer_down(2, Vec2::new(150.0, 200.0)));
    second.pointer_move(2, Vec2::new(150.0, 300.0));
    assert!(!second.is_dragging());
    assert_eq!(view.context().dragged().map(|d| d.item), Some(ItemRef::Task(1)));

    first.pointer_cancel(POINTER);
    assert!(view.context().dragged().is_none());
}

#[test]
fn test_click_is_not_a_drag() {
    let view = view(Arc::new(RecordingService::default()));
    let mut block = view.task_block(ItemRef::Task(2));
    block.pointer_down(POINTER, Vec2::new(150.0, 200.0));
    block.pointer_move(POINTER, Vec2::new(152.0, 203.0));
    block.pointer_up(POINTER, Vec2::new(152.0, 203.0));
    assert_eq!(block.take_clicks(), 1);
    assert!(view.context().dragged().is_none());
    assert_eq!(view.context().pending_len(), 0);
}

#[test]
fn test_drop_is_last_event_of_gesture() {
    let view = view_with(Arc::new(RecordingService::default()), board_without_busy());
    let ctx = view.context();
    let events = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&events);
    let _hover = ctx.bus.subscribe::<HoverChanged, _>(move |e| {
        log.lock().unwrap().push(("hover", e.0.column_id));
    });
    let log = Arc::clone(&events);
    let _drop = ctx.bus.subscribe::<DropCommitted, _>(move |e| {
        log.lock().unwrap().push(("drop", e.0.column_id));
    });

    drag(&view, ItemRef::Task(2), Vec2::new(150.0, 300.0));

    let column = Some(ColumnId::Day(day()));
    assert_eq!(
        *events.lock().unwrap(),
        vec![("hover", column), ("hover", None), ("drop", column)]
    );
    // Highlights are already cleared when the drop lands
    assert!(!view.column(day()).unwrap().is_hovered());
    assert_eq!(view.context().pending_len(), 1);
}

#[test]
fn test_cancel_publishes_no_drop() {
    let view = view(Arc::new(RecordingService::default()));
    let drops = Arc::new(Mutex::new(0));
    let count = Arc::clone(&drops);
    let _drop = view.context().bus.subscribe::<DropCommitted, _>(move |_| {
        *count.lock().unwrap() += 1;
    });

    let mut block = view.task_block(ItemRef::Task(2));
    block.pointer_down(POINTER, Vec2::new(150.0, 200.0));
    block.pointer_move(POINTER, Vec2::new(150.0, 300.0));
    block.pointer_cancel(POINTER);

    assert_eq!(*drops.lock().unwrap(), 0);
    assert!(view.context().dragged().is_none());
}
