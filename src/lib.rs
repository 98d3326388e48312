//! daygrid - day-grid scheduling engine library
//!
//! Re-exports all modules for use by the binary target.

// Core engine (event bus, drag controller, scroll sync, geometry)
pub mod core;

// Domain
pub mod entities;
pub mod schedule;
pub mod time;

// Persistence and outer surfaces
pub mod cli;
pub mod config;
pub mod runner;
pub mod server;
pub mod service;
pub mod store;
pub mod widgets;

// Re-export commonly used types from core
pub use core::event_bus::{downcast_event, BoxedEvent, EventBus, EventEmitter};

// Re-export entities and the calendar view
pub use entities::{Board, ItemKind, ItemRef, Schedule, Task, TimeBlock, WorkSession};
pub use service::{ScheduleService, ScheduleUpdate, ServiceError};
pub use store::JsonStore;
pub use widgets::CalendarView;
