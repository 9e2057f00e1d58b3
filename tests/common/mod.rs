//! In-process fake of the UniVault backend.

#![allow(dead_code)]

use axum::extract::{Multipart, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

use univault::config::Config;
use univault::models::{Role, User};
use univault::storage::{MemoryStorage, Storage};
use univault::AppContext;

pub const VALID_TOKEN: &str = "tok-1";
pub const PASSWORD: &str = "secret1";

/// What the fake backend saw and holds
#[derive(Default)]
pub struct Backend {
    /// Authorization header of every request, in order
    pub auth_headers: Mutex<Vec<Option<String>>>,
    /// Number of students on record
    pub students: Mutex<usize>,
    /// (field name, file name, size) of every uploaded part
    pub uploads: Mutex<Vec<(String, String, usize)>>,
    /// Queries received by the students endpoint
    pub student_queries: Mutex<Vec<HashMap<String, String>>>,
}

impl Backend {
    fn record(&self, headers: &HeaderMap) -> Option<String> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth_headers.lock().push(header.clone());
        header
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", VALID_TOKEN);
        self.record(headers).as_deref() == Some(expected.as_str())
    }
}

pub struct FakeServer {
    pub base_url: String,
    pub backend: Arc<Backend>,
}

impl FakeServer {
    pub async fn start() -> Self {
        let backend = Arc::new(Backend::default());
        *backend.students.lock() = 45;

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/me", get(me))
            .route("/api/students", get(list_students).post(create_student))
            .route("/api/students/import", post(import_students))
            .route("/api/students/import/template", get(template))
            .route("/api/documents", get(list_documents))
            .route("/api/users", get(list_users).post(create_user))
            .route("/api/services", get(list_services))
            .with_state(backend.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            backend,
        }
    }

    /// Client context pointed at this server, with its storage
    pub fn context(&self) -> (AppContext, Arc<MemoryStorage>) {
        context_for(&self.base_url)
    }
}

pub fn context_for(base_url: &str) -> (AppContext, Arc<MemoryStorage>) {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.timeout_secs = 5;
    config.list.debounce_ms = 20;

    let storage = Arc::new(MemoryStorage::new());
    let dyn_storage: Arc<dyn Storage> = storage.clone();
    let ctx = AppContext::new(config, dyn_storage).unwrap();
    (ctx, storage)
}

pub fn user(role: Role) -> User {
    serde_json::from_value(user_json(role)).unwrap()
}

fn user_json(role: Role) -> Value {
    json!({
        "_id": "665f1c",
        "firstName": "Awa",
        "lastName": "Diop",
        "email": "awa.diop@univ.sn",
        "role": role.as_str(),
        "service": {"_id": "svc-1", "name": "Scolarité"},
        "isActive": true
    })
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "message": message})),
    )
        .into_response()
}

async fn login(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record(&headers);
    if body["password"] != PASSWORD {
        return unauthorized("Invalid credentials");
    }
    Json(json!({
        "success": true,
        "data": {"token": VALID_TOKEN, "user": user_json(Role::Admin)}
    }))
    .into_response()
}

async fn me(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized("Token expired");
    }
    let mut user = user_json(Role::Admin);
    user["firstName"] = json!("Awa Marie");
    Json(json!({"success": true, "data": user})).into_response()
}

async fn list_students(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized("Token expired");
    }
    backend.student_queries.lock().push(query.clone());

    let search = query.get("search").cloned().unwrap_or_default().to_lowercase();
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(20);

    let count = *backend.students.lock();
    let all: Vec<Value> = (0..count)
        .map(|i| {
            let last_name = if i % 5 == 0 { "Diallo" } else { "Sy" };
            json!({
                "_id": format!("st-{}", i),
                "matricule": format!("{:07}", 2100000 + i),
                "firstName": format!("Student{}", i),
                "lastName": last_name,
                "program": "Licence Informatique"
            })
        })
        .filter(|s| {
            search.is_empty()
                || s["lastName"]
                    .as_str()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&search)
        })
        .collect();

    let total = all.len();
    let pages = total.div_ceil(limit).max(1);
    let items: Vec<Value> = all
        .into_iter()
        .skip(page.saturating_sub(1) * limit)
        .take(limit)
        .collect();
    Json(json!({
        "success": true,
        "data": items,
        "pagination": {"page": page, "limit": limit, "total": total, "pages": pages}
    }))
    .into_response()
}

async fn create_student(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized("Token expired");
    }
    let mut student = body.clone();
    student["_id"] = json!("st-new");
    *backend.students.lock() += 1;
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "data": student})),
    )
        .into_response()
}

async fn import_students(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized("Token expired");
    }
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let size = field.bytes().await.unwrap().len();
        backend.uploads.lock().push((name, file_name, size));
    }

    *backend.students.lock() += 7;
    Json(json!({
        "success": true,
        "data": {
            "imported": 7,
            "duplicates": 2,
            "errors": 1,
            "details": {
                "duplicates": [
                    {"line": 3, "matricule": 2100001, "name": "Moussa Sarr"},
                    {"line": 8, "matricule": "2100006", "name": "Khady Ba"}
                ],
                "errors": [
                    {"line": 5, "matricule": "123", "error": "Invalid matricule format (expected 5 or 7 digits)"}
                ]
            }
        }
    }))
    .into_response()
}

async fn template(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.record(&headers);
    (
        [(axum::http::header::CONTENT_TYPE, "text/csv")],
        "matricule,firstName,lastName,dateOfBirth,program\n",
    )
        .into_response()
}

async fn list_documents(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.record(&headers);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": "Database unavailable",
            "code": "DB_DOWN"
        })),
    )
        .into_response()
}

async fn list_users(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized("Token expired");
    }
    Json(json!({
        "success": true,
        "data": {
            "data": [user_json(Role::Admin), user_json(Role::User)],
            "pagination": {"total": 2, "pages": 1}
        }
    }))
    .into_response()
}

async fn create_user(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.record(&headers);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "message": "Validation failed",
            "errors": {"email": ["Email already in use"]}
        })),
    )
        .into_response()
}

async fn list_services(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.record(&headers);
    Json(json!({
        "success": true,
        "data": [
            {"_id": "svc-1", "name": "Scolarité", "documentTypes": ["relevé", "attestation"]},
            {"_id": "svc-2", "name": "Bibliothèque"}
        ]
    }))
    .into_response()
}
