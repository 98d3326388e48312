//! REST API implementation using rouille.
//!
//! # Key types
//!
//! - [`ApiServer`] - HTTP server runner, blocking or on a background thread
//! - [`handle_request`] - the router, usable without a socket
//!
//! # Thread safety
//!
//! Handlers share one `Arc<JsonStore>`; the store serialises mutations
//! itself. CORS headers are added to all responses for browser access.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::entities::{ItemKind, ItemRef, NewTimeBlock, Schedule, TaskDraft, WorkSessionDraft, timestamp};
use crate::store::{JsonStore, StoreError};

/// Body of `PUT /api/schedule/{kind}/{id}`.
///
/// `startsAt: null` moves the item to the backlog. A missing duration keeps
/// the item's current one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleBody {
    #[serde(default, with = "timestamp::optional")]
    starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    duration: Option<i64>,
}

/// Generic API response
#[derive(Serialize)]
struct ApiResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn ok_msg(msg: &str) -> Self {
        Self { success: true, message: Some(msg.to_string()), error: None }
    }

    fn err(msg: &str) -> Self {
        Self { success: false, message: None, error: Some(msg.to_string()) }
    }
}

/// Entity collection addressed by the first path segment after `/api/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Tasks,
    WorkSessions,
    TimeBlocks,
}

impl Collection {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "tasks" => Some(Collection::Tasks),
            "work-sessions" => Some(Collection::WorkSessions),
            "time-blocks" => Some(Collection::TimeBlocks),
            _ => None,
        }
    }
}

/// REST API server
pub struct ApiServer {
    port: u16,
    store: Arc<JsonStore>,
}

impl ApiServer {
    pub fn new(port: u16, store: Arc<JsonStore>) -> Self {
        Self { port, store }
    }

    /// Start the API server in a background thread.
    pub fn start(port: u16, store: Arc<JsonStore>) -> thread::JoinHandle<()> {
        let server = ApiServer::new(port, store);
        thread::spawn(move || {
            server.run();
        })
    }

    /// Serve until the process exits.
    pub fn run(self) {
        let addr = format!("0.0.0.0:{}", self.port);
        info!("API server starting on http://{}", addr);

        let store = self.store;
        rouille::start_server(&addr, move |request| handle_request(request, &store));
    }
}

fn cors(response: Response) -> Response {
    response.with_additional_header("Access-Control-Allow-Origin", "*")
}

/// Route one request against `store`.
pub fn handle_request(request: &Request, store: &JsonStore) -> Response {
    if request.method() == "OPTIONS" {
        return Response::empty_204()
            .with_additional_header("Access-Control-Allow-Origin", "*")
            .with_additional_header("Access-Control-Allow-Methods", "GET, POST, PUT, PATCH, DELETE, OPTIONS")
            .with_additional_header("Access-Control-Allow-Headers", "Content-Type");
    }
    debug!("{} {}", request.method(), request.url());

    // Paths with ids are parsed by hand so a malformed id is a 400, not a 404
    let url = request.url();
    let segments: Vec<&str> = url.trim_start_matches("/api/").split('/').collect();
    let routed = match segments.as_slice() {
        ["schedule", kind, id] => Some(put_schedule(request, store, kind, id)),
        [collection, id] if Collection::parse(collection).is_some() => Collection::parse(collection)
            .map(|c| item_route(request, store, c, id)),
        _ => None,
    };
    if let Some(response) = routed {
        return cors(response);
    }

    let response = rouille::router!(request,
        (GET) ["/api/health"] => {
            Response::json(&ApiResponse::ok_msg("daygrid API server"))
        },
        (GET) ["/api/tasks"] => {
            respond(store.tasks(), 200)
        },
        (POST) ["/api/tasks"] => {
            with_body::<TaskDraft>(request, |draft| {
                respond(store.create_task(draft).map(|(task, block)| json!({"task": task, "timeBlock": block})), 201)
            })
        },
        (GET) ["/api/work-sessions"] => {
            respond(store.work_sessions(), 200)
        },
        (POST) ["/api/work-sessions"] => {
            with_body::<WorkSessionDraft>(request, |draft| {
                respond(
                    store
                        .create_work_session(draft)
                        .map(|(session, block)| json!({"workSession": session, "timeBlock": block})),
                    201,
                )
            })
        },
        (GET) ["/api/time-blocks"] => {
            respond(store.time_blocks(), 200)
        },
        (POST) ["/api/time-blocks"] => {
            with_body::<NewTimeBlock>(request, |new| respond(store.create_time_block(new), 201))
        },
        _ => {
            Response::json(&ApiResponse::err("Not found")).with_status_code(404)
        }
    );

    cors(response)
}

/// PATCH / DELETE on `/api/{collection}/{id}`.
fn item_route(request: &Request, store: &JsonStore, collection: Collection, id: &str) -> Response {
    let Ok(id) = id.parse::<u64>() else {
        return bad_request(&format!("Invalid id {id:?}"));
    };
    match (request.method(), collection) {
        ("PATCH", Collection::Tasks) => with_body::<Value>(request, |patch| respond(store.patch_task(id, &patch), 200)),
        ("PATCH", Collection::WorkSessions) => {
            with_body::<Value>(request, |patch| respond(store.patch_work_session(id, &patch), 200))
        }
        ("PATCH", Collection::TimeBlocks) => with_body::<Value>(request, |patch| {
            match store.patch_time_block(id, &patch) {
                Ok(Some(block)) => Response::json(&block),
                // Degenerate after the patch: the block was removed
                Ok(None) => Response::empty_204(),
                Err(e) => store_error(&e),
            }
        }),
        ("DELETE", Collection::Tasks) => no_content(store.delete_task(id)),
        ("DELETE", Collection::WorkSessions) => no_content(store.delete_work_session(id)),
        ("DELETE", Collection::TimeBlocks) => no_content(store.delete_time_block(id)),
        _ => Response::json(&ApiResponse::err("Method not allowed")).with_status_code(405),
    }
}

fn put_schedule(request: &Request, store: &JsonStore, kind: &str, id: &str) -> Response {
    if request.method() != "PUT" {
        return Response::json(&ApiResponse::err("Method not allowed")).with_status_code(405);
    }
    let kind = match kind.parse::<ItemKind>() {
        Ok(kind) => kind,
        Err(e) => return bad_request(&e),
    };
    let Ok(id) = id.parse::<u64>() else {
        return bad_request(&format!("Invalid id {id:?}"));
    };
    let item = ItemRef::new(kind, id);

    with_body::<ScheduleBody>(request, |body| {
        let schedule = match body.starts_at {
            None => None,
            Some(starts_at) => {
                let duration = match body.duration {
                    Some(duration) => duration,
                    None => match store.load_board() {
                        Ok(board) => board.duration_of(item),
                        Err(e) => return store_error(&e),
                    },
                };
                Some(Schedule::new(starts_at, duration))
            }
        };
        respond(store.update_schedule(item, schedule), 200)
    })
}

fn with_body<T>(request: &Request, f: impl FnOnce(T) -> Response) -> Response
where
    T: serde::de::DeserializeOwned,
{
    match rouille::input::json_input::<T>(request) {
        Ok(body) => f(body),
        Err(e) => bad_request(&format!("Invalid JSON: {}", e)),
    }
}

fn respond<T: Serialize>(result: Result<T, StoreError>, status: u16) -> Response {
    match result {
        Ok(value) => Response::json(&value).with_status_code(status),
        Err(e) => store_error(&e),
    }
}

fn no_content(result: Result<(), StoreError>) -> Response {
    match result {
        Ok(()) => Response::empty_204(),
        Err(e) => store_error(&e),
    }
}

fn bad_request(msg: &str) -> Response {
    Response::json(&ApiResponse::err(msg)).with_status_code(400)
}

fn store_error(e: &StoreError) -> Response {
    let status = match e {
        StoreError::NotFound { .. } => 404,
        StoreError::Validation { .. } => 400,
        StoreError::Io { .. } | StoreError::Json { .. } => {
            error!("Store failure: {e}");
            500
        }
    };
    Response::json(&ApiResponse::err(&e.to_string())).with_status_code(status)
}
