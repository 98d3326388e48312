//! REST API server over the JSON store.
//!
//! - **rouille** - sync HTTP server, one thread per connection
//! - **JsonStore** - shared by all handler threads behind an `Arc`
//!
//! # Endpoints
//!
//! | Method | Path                              | Description                      |
//! |--------|-----------------------------------|----------------------------------|
//! | GET    | `/api/health`                     | Health check                     |
//! | GET    | `/api/tasks`                      | List tasks                       |
//! | POST   | `/api/tasks`                      | Create task (+ time block)       |
//! | PATCH  | `/api/tasks/{id}`                 | Merge-patch task                 |
//! | DELETE | `/api/tasks/{id}`                 | Delete task and its block        |
//! | GET    | `/api/work-sessions`              | List work sessions               |
//! | POST   | `/api/work-sessions`              | Create (minimum duration)        |
//! | PATCH  | `/api/work-sessions/{id}`         | Merge-patch work session         |
//! | DELETE | `/api/work-sessions/{id}`         | Delete, detaching its tasks      |
//! | GET    | `/api/time-blocks`                | List time blocks                 |
//! | POST   | `/api/time-blocks`                | Create (exactly one owner)       |
//! | PATCH  | `/api/time-blocks/{id}`           | Merge-patch time block           |
//! | DELETE | `/api/time-blocks/{id}`           | Delete time block                |
//! | PUT    | `/api/schedule/{kind}/{id}`       | Schedule or backlog an item      |

mod api;

pub use api::{ApiServer, handle_request};
