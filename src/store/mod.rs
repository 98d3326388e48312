//! Flat JSON file persistence.
//!
//! Files in the data directory:
//! - `tasks.json`, `work_sessions.json`, `time_blocks.json`: arrays of entities
//! - `meta.json`: next id per entity kind

mod error;
mod file;
mod meta;
#[allow(clippy::module_inception)]
mod store;

pub use error::StoreError;
pub use file::{read_json, write_json};
pub use meta::{Counter, Counters};
pub use store::{JsonStore, META_FILE, TASKS_FILE, TIME_BLOCKS_FILE, WORK_SESSIONS_FILE};
