//! In-process fake of the employee backend plus helpers to wire an `App`
//! against it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use onboard_core::auth::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use onboard_core::{App, Config};

#[derive(Default)]
struct Inner {
    next_id: u64,
    next_todo_id: u64,
    employees: HashMap<String, Value>,
    tokens: HashMap<String, String>,
    todos: HashMap<String, Vec<Value>>,
    uploads: Vec<String>,
    last_headers: Option<HeaderMap>,
    last_query: Option<HashMap<String, String>>,
}

#[derive(Default)]
pub struct BackendState {
    requests: AtomicUsize,
    reject_sign_ins: AtomicBool,
    tokens_revoked: AtomicBool,
    inner: Mutex<Inner>,
}

impl BackendState {
    fn hit(&self, headers: &HeaderMap) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().unwrap().last_headers = Some(headers.clone());
    }

    fn authorize(&self, headers: &HeaderMap, path_id: &str) -> Result<String, Response> {
        if self.tokens_revoked.load(Ordering::SeqCst) {
            return Err(StatusCode::UNAUTHORIZED.into_response());
        }
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;
        let inner = self.inner.lock().unwrap();
        match inner.tokens.get(token) {
            Some(id) if id == path_id => Ok(id.clone()),
            Some(_) => Err(StatusCode::FORBIDDEN.into_response()),
            None => Err(StatusCode::UNAUTHORIZED.into_response()),
        }
    }

    fn any_token_owner(&self, headers: &HeaderMap) -> Result<String, Response> {
        if self.tokens_revoked.load(Ordering::SeqCst) {
            return Err(StatusCode::UNAUTHORIZED.into_response());
        }
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;
        self.inner
            .lock()
            .unwrap()
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())
    }
}

/// Handle on a running fake backend.
pub struct FakeBackend {
    pub base_url: String,
    state: Arc<BackendState>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let router = Router::new()
            .route("/api/employees", post(register))
            .route("/api/employees/signin", post(sign_in))
            .route("/api/employees/{id}", get(get_employee).put(put_employee))
            .route("/api/employees/{id}/updatePassword", put(update_password))
            .route("/api/employees/{id}/todos", get(list_todos).post(create_todo))
            .route(
                "/api/employees/{id}/todos/{todo_id}",
                put(update_todo).delete(delete_todo),
            )
            .route("/api/upload/direct", post(upload))
            .route("/slow", get(slow))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake backend server");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Create an account directly, bypassing the HTTP API. Returns its id.
    pub fn seed_employee(&self, email: &str, password: &str) -> String {
        let mut inner = self.state.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.employees.insert(
            id.to_string(),
            json!({
                "id": id,
                "employeeName": "Seeded Employee",
                "email": email,
                "phoneNumber": "5551234567",
                "address": "1 Main St",
                "password": password,
                "department": "IT",
                "isMale": true,
                "dateOfBirth": "1990-01-01",
                "photoUrl": "",
                "resumeUrl": "",
                "checkBoxOptions": []
            }),
        );
        id.to_string()
    }

    pub fn employee(&self, id: &str) -> Option<Value> {
        self.state.inner.lock().unwrap().employees.get(id).cloned()
    }

    pub fn employee_by_email(&self, email: &str) -> Option<Value> {
        self.state
            .inner
            .lock()
            .unwrap()
            .employees
            .values()
            .find(|e| e["email"] == email)
            .cloned()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn last_header(&self, name: header::HeaderName) -> Option<String> {
        self.state
            .inner
            .lock()
            .unwrap()
            .last_headers
            .as_ref()
            .and_then(|h| h.get(name))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn last_query(&self) -> Option<HashMap<String, String>> {
        self.state.inner.lock().unwrap().last_query.clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state.inner.lock().unwrap().uploads.clone()
    }

    pub fn reject_sign_ins(&self, reject: bool) {
        self.state.reject_sign_ins.store(reject, Ordering::SeqCst);
    }

    /// Make every authenticated endpoint answer 401.
    pub fn revoke_tokens(&self) {
        self.state.tokens_revoked.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn register(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    state.hit(&headers);
    let mut inner = state.inner.lock().unwrap();
    let email = body["email"].clone();
    if inner.employees.values().any(|e| e["email"] == email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Email already registered"})),
        )
            .into_response();
    }
    inner.next_id += 1;
    let id = inner.next_id;
    body["id"] = json!(id);
    inner.employees.insert(id.to_string(), body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn sign_in(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit(&headers);
    let mut inner = state.inner.lock().unwrap();
    inner.last_query = Some(query.clone());
    if state.reject_sign_ins.load(Ordering::SeqCst) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let email = query.get("email").cloned().unwrap_or_default();
    let password = query.get("password").cloned().unwrap_or_default();
    let found = inner
        .employees
        .iter()
        .find(|(_, e)| e["email"] == email.as_str() && e["password"] == password.as_str())
        .map(|(id, _)| id.clone());
    match found {
        Some(id) => {
            let token = format!("token-{}-{}", id, inner.tokens.len() + 1);
            inner.tokens.insert(token.clone(), id.clone());
            let numeric_id: u64 = id.parse().unwrap();
            Json(json!({"token": token, "id": numeric_id})).into_response()
        }
        None => (StatusCode::UNAUTHORIZED, "Invalid email or password").into_response(),
    }
}

async fn get_employee(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.hit(&headers);
    if let Err(r) = state.authorize(&headers, &id) {
        return r;
    }
    let inner = state.inner.lock().unwrap();
    match inner.employees.get(&id) {
        Some(e) => Json(e.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn put_employee(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    state.hit(&headers);
    if let Err(r) = state.authorize(&headers, &id) {
        return r;
    }
    let mut inner = state.inner.lock().unwrap();
    let Some(existing) = inner.employees.get(&id).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    body["id"] = existing["id"].clone();
    if body.get("password").is_none() {
        body["password"] = existing["password"].clone();
    }
    inner.employees.insert(id, body.clone());
    Json(body).into_response()
}

async fn update_password(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit(&headers);
    if let Err(r) = state.authorize(&headers, &id) {
        return r;
    }
    let mut inner = state.inner.lock().unwrap();
    inner.last_query = Some(query.clone());
    let Some(employee) = inner.employees.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if query.get("oldPassword").map(String::as_str) != employee["password"].as_str() {
        return (StatusCode::BAD_REQUEST, "Current password is incorrect").into_response();
    }
    employee["password"] = json!(query.get("newPassword").cloned().unwrap_or_default());
    (StatusCode::OK, "Password updated").into_response()
}

async fn list_todos(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.hit(&headers);
    if let Err(r) = state.authorize(&headers, &id) {
        return r;
    }
    let inner = state.inner.lock().unwrap();
    Json(inner.todos.get(&id).cloned().unwrap_or_default()).into_response()
}

async fn create_todo(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    state.hit(&headers);
    if let Err(r) = state.authorize(&headers, &id) {
        return r;
    }
    let mut inner = state.inner.lock().unwrap();
    inner.next_todo_id += 1;
    body["id"] = json!(inner.next_todo_id);
    inner.todos.entry(id).or_default().push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_todo(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((id, todo_id)): Path<(String, String)>,
    Json(mut body): Json<Value>,
) -> Response {
    state.hit(&headers);
    if let Err(r) = state.authorize(&headers, &id) {
        return r;
    }
    let mut inner = state.inner.lock().unwrap();
    let todos = inner.todos.entry(id).or_default();
    match todos.iter_mut().find(|t| t["id"].to_string() == todo_id) {
        Some(todo) => {
            body["id"] = todo["id"].clone();
            *todo = body.clone();
            Json(body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_todo(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path((id, todo_id)): Path<(String, String)>,
) -> Response {
    state.hit(&headers);
    if let Err(r) = state.authorize(&headers, &id) {
        return r;
    }
    let mut inner = state.inner.lock().unwrap();
    let todos = inner.todos.entry(id).or_default();
    let before = todos.len();
    todos.retain(|t| t["id"].to_string() != todo_id);
    if todos.len() == before {
        StatusCode::NOT_FOUND.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn upload(State(state): State<Arc<BackendState>>, headers: HeaderMap, body: Bytes) -> Response {
    state.hit(&headers);
    if let Err(r) = state.any_token_owner(&headers) {
        return r;
    }
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);
    let text = String::from_utf8_lossy(&body);
    if !is_multipart || !text.contains("name=\"file\"") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let file_name = text
        .split("filename=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap_or("unknown")
        .to_string();
    let mut inner = state.inner.lock().unwrap();
    inner.uploads.push(file_name.clone());
    Json(json!({"fileUrl": format!("https://files.example.com/{}", file_name)})).into_response()
}

async fn slow(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.hit(&headers);
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK.into_response()
}

// ============================================================================
// App wiring
// ============================================================================

pub struct TestSetup {
    pub backend: FakeBackend,
    pub store: Arc<dyn CredentialStore>,
    pub app: App,
    _dir: Option<tempfile::TempDir>,
}

pub struct TestSetupBuilder {
    file_store: bool,
    timeout_secs: Option<u64>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            file_store: false,
            timeout_secs: None,
        }
    }

    /// Persist the credential in a temporary directory instead of memory.
    pub fn with_file_store(mut self) -> Self {
        self.file_store = true;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub async fn build(self) -> TestSetup {
        let backend = FakeBackend::start().await;
        let (store, dir): (Arc<dyn CredentialStore>, _) = if self.file_store {
            let dir = tempfile::tempdir().expect("temp dir");
            let store = FileCredentialStore::new(dir.path().join("onboard"));
            (Arc::new(store), Some(dir))
        } else {
            (Arc::new(MemoryCredentialStore::new()), None)
        };
        let config = Config {
            request_timeout_secs: self.timeout_secs,
            ..Config::with_api_url(backend.base_url.clone())
        };
        let app = App::new(config, store.clone()).expect("app should build");
        TestSetup {
            backend,
            store,
            app,
            _dir: dir,
        }
    }
}

impl TestSetup {
    /// Seed an account and sign in as it. Returns the employee id.
    pub async fn signed_in(&self, email: &str, password: &str) -> String {
        let id = self.backend.seed_employee(email, password);
        self.app
            .auth
            .sign_in(email, password)
            .await
            .expect("seeded sign-in should succeed");
        id
    }
}
