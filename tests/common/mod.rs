#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use notification_bell::domain::notification::{
    Category, NewNotification, Notification, NotificationId, Priority,
};
use notification_bell::infra::api::{ApiError, NotificationApi, PageRequest};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn notification(id: i64, is_read: bool) -> Notification {
    Notification {
        id: NotificationId(id),
        title: format!("notification {}", id),
        body: Some(format!("body {}", id)),
        category: Category::general(),
        priority: Priority::Normal,
        is_read,
        created_at: None,
        link: None,
    }
}

pub fn with_link(mut item: Notification, link: &str) -> Notification {
    item.link = Some(link.to_string());
    item
}

/// Descending ids from `from` down to `from - count + 1`, all unread.
pub fn unread_page(from: i64, count: usize) -> Vec<Notification> {
    (0..count as i64).map(|offset| notification(from - offset, false)).collect()
}

pub fn server_error(status: u16) -> ApiError {
    ApiError::Server {
        status,
        message: "scripted failure".to_string(),
    }
}

pub fn ids(items: &[Notification]) -> Vec<i64> {
    items.iter().map(|item| item.id.0).collect()
}

// ---------------------------------------------------------------------------
// ScriptedApi: in-memory NotificationApi with call recording
// ---------------------------------------------------------------------------

/// List responses are served in script order; an exhausted script returns
/// empty pages. Error entries carry an HTTP status.
#[derive(Default)]
pub struct ScriptedApi {
    pages: Mutex<VecDeque<Result<Vec<Notification>, u16>>>,
    list_calls: Mutex<Vec<PageRequest>>,
    list_gate: Mutex<Option<Arc<Notify>>>,
    unread: AtomicU64,
    fail_unread: AtomicBool,
    unread_calls: AtomicUsize,
    mark_read_calls: Mutex<Vec<NotificationId>>,
    fail_mark_read: AtomicBool,
    mark_all_calls: AtomicUsize,
    fail_mark_all: AtomicBool,
    create_calls: Mutex<Vec<NewNotification>>,
    create_failure: Mutex<Option<u16>>,
    delete_calls: Mutex<Vec<NotificationId>>,
    delete_failure: Mutex<Option<u16>>,
    next_id: AtomicU64,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        api.next_id.store(1000, Ordering::SeqCst);
        Arc::new(api)
    }

    pub fn as_api(self: &Arc<Self>) -> Arc<dyn NotificationApi> {
        self.clone()
    }

    pub fn push_page(&self, items: Vec<Notification>) {
        self.pages.lock().unwrap().push_back(Ok(items));
    }

    pub fn push_failure(&self, status: u16) {
        self.pages.lock().unwrap().push_back(Err(status));
    }

    /// Holds every subsequent `list` call until the returned gate is
    /// notified (one permit per call).
    pub fn gate_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Lets later `list` calls through immediately again.
    pub fn ungate_lists(&self) {
        *self.list_gate.lock().unwrap() = None;
    }

    pub fn list_calls(&self) -> Vec<PageRequest> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn set_unread(&self, count: u64) {
        self.unread.store(count, Ordering::SeqCst);
    }

    pub fn fail_unread(&self, fail: bool) {
        self.fail_unread.store(fail, Ordering::SeqCst);
    }

    pub fn unread_calls(&self) -> usize {
        self.unread_calls.load(Ordering::SeqCst)
    }

    pub fn fail_mark_read(&self, fail: bool) {
        self.fail_mark_read.store(fail, Ordering::SeqCst);
    }

    pub fn mark_read_calls(&self) -> Vec<NotificationId> {
        self.mark_read_calls.lock().unwrap().clone()
    }

    pub fn fail_mark_all(&self, fail: bool) {
        self.fail_mark_all.store(fail, Ordering::SeqCst);
    }

    pub fn mark_all_calls(&self) -> usize {
        self.mark_all_calls.load(Ordering::SeqCst)
    }

    pub fn fail_create(&self, status: Option<u16>) {
        *self.create_failure.lock().unwrap() = status;
    }

    pub fn create_calls(&self) -> Vec<NewNotification> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn fail_delete(&self, status: Option<u16>) {
        *self.delete_failure.lock().unwrap() = status;
    }

    pub fn delete_calls(&self) -> Vec<NotificationId> {
        self.delete_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationApi for ScriptedApi {
    async fn list(&self, request: PageRequest) -> Result<Vec<Notification>, ApiError> {
        self.list_calls.lock().unwrap().push(request);
        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.pages.lock().unwrap().pop_front() {
            Some(Ok(items)) => Ok(items),
            Some(Err(status)) => Err(server_error(status)),
            None => Ok(Vec::new()),
        }
    }

    async fn unread_count(&self) -> Result<u64, ApiError> {
        self.unread_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_unread.load(Ordering::SeqCst) {
            return Err(server_error(503));
        }
        Ok(self.unread.load(Ordering::SeqCst))
    }

    async fn create(&self, request: &NewNotification) -> Result<Notification, ApiError> {
        self.create_calls.lock().unwrap().push(request.clone());
        if let Some(status) = *self.create_failure.lock().unwrap() {
            return Err(server_error(status));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        Ok(Notification {
            id: NotificationId(id),
            title: request.title.clone(),
            body: Some(request.body.clone()),
            category: request.category.clone(),
            priority: request.priority,
            is_read: false,
            created_at: None,
            link: request.link.clone(),
        })
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), ApiError> {
        self.mark_read_calls.lock().unwrap().push(id);
        if self.fail_mark_read.load(Ordering::SeqCst) {
            return Err(server_error(500));
        }
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.mark_all_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mark_all.load(Ordering::SeqCst) {
            return Err(server_error(500));
        }
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> Result<(), ApiError> {
        self.delete_calls.lock().unwrap().push(id);
        match *self.delete_failure.lock().unwrap() {
            Some(status) => Err(server_error(status)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// FakeBackend: axum server speaking the REST contract
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct BackendState {
    pub records: Vec<Value>,
    pub unread_count: Option<u64>,
    pub requests: Vec<RecordedRequest>,
    pub bare_array: bool,
    pub list_failure: Option<u16>,
    pub created: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub uri: String,
    pub authorization: Option<String>,
}

type Shared = Arc<Mutex<BackendState>>;

pub struct FakeBackend {
    pub base_url: String,
    pub state: Shared,
}

impl FakeBackend {
    /// Binds to a random local port and serves under `/api`.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::default()));

        let routes = Router::new()
            .route("/notifications", get(list).post(create))
            .route("/notifications/unread-count", get(unread_count))
            .route("/notifications/mark-all-read", put(mark_all_read))
            .route("/notifications/:id/read", put(mark_read))
            .route("/notifications/:id", axum::routing::delete(delete))
            .with_state(state.clone());
        let app = Router::new().nest("/api", routes);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn seed(&self, records: Vec<Value>) {
        self.state.lock().unwrap().records = records;
    }

    pub fn set_unread(&self, count: Option<u64>) {
        self.state.lock().unwrap().unread_count = count;
    }

    pub fn serve_bare_array(&self) {
        self.state.lock().unwrap().bare_array = true;
    }

    pub fn fail_lists(&self, status: u16) {
        self.state.lock().unwrap().list_failure = Some(status);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn record(&self, id: i64) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|record| record["id"].as_i64() == Some(id))
            .cloned()
    }
}

pub fn wire_record(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "title": format!("notification {}", id),
        "body": format!("body {}", id),
        "type": "GENERAL",
        "status": status,
        "readAt": null,
        "createdAt": "2024-05-01T10:20:30",
        "link": null,
        "priority": "NORMAL"
    })
}

fn remember(state: &Shared, method: &'static str, uri: &Uri, headers: &HeaderMap) {
    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.lock().unwrap().requests.push(RecordedRequest {
        method,
        uri: uri.to_string(),
        authorization,
    });
}

fn number_param(params: &HashMap<String, String>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

async fn list(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    remember(&state, "GET", &uri, &headers);
    let page = number_param(&params, "page", 0);
    let size = number_param(&params, "size", 20);

    let guard = state.lock().unwrap();
    if let Some(status) = guard.list_failure {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, Json(json!({ "error": "list failed" })));
    }

    let mut records = guard.records.clone();
    records.sort_by_key(|record| std::cmp::Reverse(record["id"].as_i64().unwrap_or(0)));
    let total = records.len();
    let content: Vec<Value> = records.into_iter().skip(page * size).take(size).collect();

    if guard.bare_array {
        return (StatusCode::OK, Json(Value::Array(content)));
    }
    let total_pages = if size == 0 { 0 } else { total.div_ceil(size) };
    (
        StatusCode::OK,
        Json(json!({
            "content": content,
            "totalPages": total_pages,
            "totalElements": total,
            "number": page,
            "size": size
        })),
    )
}

async fn unread_count(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Json<Value> {
    remember(&state, "GET", &uri, &headers);
    let guard = state.lock().unwrap();
    let count = guard.unread_count.unwrap_or_else(|| {
        guard
            .records
            .iter()
            .filter(|record| record["status"] != "READ")
            .count() as u64
    });
    Json(json!({ "unreadCount": count }))
}

async fn create(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    remember(&state, "POST", &uri, &headers);
    let mut guard = state.lock().unwrap();
    guard.created.push(body.clone());

    let next_id = guard
        .records
        .iter()
        .filter_map(|record| record["id"].as_i64())
        .max()
        .unwrap_or(0)
        + 1;
    let record = json!({
        "id": next_id,
        "title": body["title"],
        "body": body["body"],
        "type": body["type"],
        "status": "UNREAD",
        "readAt": null,
        "createdAt": "2024-05-02T08:00:00Z",
        "link": body["link"],
        "priority": body["priority"]
    });
    guard.records.push(record.clone());
    (StatusCode::CREATED, Json(record))
}

async fn mark_read(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> StatusCode {
    remember(&state, "PUT", &uri, &headers);
    let mut guard = state.lock().unwrap();
    match guard
        .records
        .iter_mut()
        .find(|record| record["id"].as_i64() == Some(id))
    {
        Some(record) => {
            record["status"] = json!("READ");
            record["readAt"] = json!("2024-05-03T09:00:00Z");
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn mark_all_read(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> StatusCode {
    remember(&state, "PUT", &uri, &headers);
    let mut guard = state.lock().unwrap();
    for record in guard.records.iter_mut() {
        record["status"] = json!("READ");
    }
    StatusCode::OK
}

async fn delete(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> StatusCode {
    remember(&state, "DELETE", &uri, &headers);
    let mut guard = state.lock().unwrap();
    let before = guard.records.len();
    guard.records.retain(|record| record["id"].as_i64() != Some(id));
    if guard.records.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
