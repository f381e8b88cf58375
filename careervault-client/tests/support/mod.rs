//! In-process stand-in for the CareerVault backend.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, patch, post},
};
use client::{AppContext, MemoryTokenStore, TokenStore};
use serde_json::{Value, json};
use shared::config::ClientConfig;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};
use tokio::net::TcpListener;
use url::Url;

type Reply = (StatusCode, Json<Value>);

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret";

#[derive(Debug)]
pub struct Backend {
    accounts: Mutex<HashMap<String, String>>,
    valid_token: Mutex<Option<String>>,
    jobs: Mutex<Vec<Value>>,
    next_id: AtomicU64,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub fail_refresh: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            accounts: Mutex::new(HashMap::from([(EMAIL.to_string(), PASSWORD.to_string())])),
            valid_token: Mutex::new(None),
            jobs: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            fail_refresh: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl Backend {
    /// Insert a job directly, bypassing the client.
    pub fn seed(&self, position: &str, company: &str, status: &str) -> String {
        let id = self.next_id();
        self.jobs.lock().unwrap().push(json!({
            "id": id,
            "position": position,
            "company": company,
            "status": status,
            "applied_date": "2025-01-01",
        }));
        id
    }

    pub fn job_ids(&self) -> Vec<String> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .filter_map(|job| job["id"].as_str().map(str::to_string))
            .collect()
    }

    pub fn accept_token(&self, token: &str) {
        *self.valid_token.lock().unwrap() = Some(token.to_string());
    }

    fn next_id(&self) -> String {
        format!("j{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn authorized(&self, headers: &HeaderMap) -> Result<(), Reply> {
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        let valid = self.valid_token.lock().unwrap();
        match (presented, valid.as_deref()) {
            (Some(presented), Some(valid)) if presented == valid => Ok(()),
            _ => Err(error(StatusCode::UNAUTHORIZED, "Could not validate credentials")),
        }
    }

    fn write_guard(&self) -> Result<(), Reply> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save job"))
        } else {
            Ok(())
        }
    }
}

fn error(status: StatusCode, detail: &str) -> Reply {
    (status, Json(json!({ "detail": detail })))
}

fn ok(body: Value) -> Reply {
    (StatusCode::OK, Json(body))
}

fn unwrap_reply(result: Result<Reply, Reply>) -> Reply {
    result.unwrap_or_else(|reply| reply)
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Reply {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let known = backend.accounts.lock().unwrap().get(username).cloned();
    if known.as_deref() != Some(password) {
        return error(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }
    backend.accept_token("T");
    ok(json!({
        "access_token": "T",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "R",
    }))
}

async fn signup(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let mut accounts = backend.accounts.lock().unwrap();
    if accounts.contains_key(&email) {
        return error(StatusCode::BAD_REQUEST, "User with this email already exists");
    }
    accounts.insert(email, password);
    ok(json!({ "message": "User created successfully", "success": true }))
}

async fn me(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Reply {
    unwrap_reply(backend.authorized(&headers).map(|()| {
        ok(json!({ "id": "u1", "username": "alice", "email": EMAIL }))
    }))
}

async fn refresh(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Reply {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if backend.fail_refresh.load(Ordering::SeqCst) || body["refresh_token"] != "R" {
        return error(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    }
    backend.accept_token("T2");
    ok(json!({ "access_token": "T2", "token_type": "bearer", "expires_in": 3600 }))
}

async fn logout(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Reply {
    backend.logout_calls.fetch_add(1, Ordering::SeqCst);
    unwrap_reply(backend.authorized(&headers).map(|()| {
        *backend.valid_token.lock().unwrap() = None;
        ok(json!({ "message": "Successfully logged out" }))
    }))
}

fn select_jobs(backend: &Backend, status: Option<&str>, limit: Option<&String>) -> Value {
    let limit = limit
        .and_then(|limit| limit.parse().ok())
        .unwrap_or(usize::MAX);
    let jobs: Vec<Value> = backend
        .jobs
        .lock()
        .unwrap()
        .iter()
        .filter(|job| status.is_none_or(|status| job["status"] == status))
        .take(limit)
        .cloned()
        .collect();
    Value::Array(jobs)
}

async fn list_jobs(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    unwrap_reply(backend.authorized(&headers).map(|()| {
        let status = query.get("status_filter").map(String::as_str);
        ok(select_jobs(&backend, status, query.get("limit")))
    }))
}

async fn jobs_by_status(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(status): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    unwrap_reply(backend.authorized(&headers).map(|()| {
        // Paged envelope, as the by-status endpoint returns.
        ok(json!({ "jobs": select_jobs(&backend, Some(&status), query.get("limit")) }))
    }))
}

async fn create_job(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    let result = backend.authorized(&headers).and_then(|()| {
        backend.write_guard()?;
        body["id"] = Value::String(backend.next_id());
        backend.jobs.lock().unwrap().push(body.clone());
        Ok((StatusCode::CREATED, Json(body)))
    });
    unwrap_reply(result)
}

fn with_job(backend: &Backend, id: &str, f: impl FnOnce(&mut Value)) -> Reply {
    let mut jobs = backend.jobs.lock().unwrap();
    match jobs.iter_mut().find(|job| job["id"] == id) {
        Some(job) => {
            f(job);
            ok(job.clone())
        }
        None => error(StatusCode::NOT_FOUND, "Job not found"),
    }
}

async fn get_job(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    unwrap_reply(
        backend
            .authorized(&headers)
            .map(|()| with_job(&backend, &id, |_| {})),
    )
}

async fn update_job(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let result = backend.authorized(&headers).and_then(|()| {
        backend.write_guard()?;
        Ok(with_job(&backend, &id, |job| {
            let mut replacement = body;
            replacement["id"] = Value::String(id.clone());
            *job = replacement;
        }))
    });
    unwrap_reply(result)
}

async fn delete_job(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let result = backend.authorized(&headers).and_then(|()| {
        backend.write_guard()?;
        let mut jobs = backend.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|job| job["id"] != id.as_str());
        if jobs.len() == before {
            Err(error(StatusCode::NOT_FOUND, "Job not found"))
        } else {
            Ok(ok(json!({ "message": "Job deleted successfully" })))
        }
    });
    unwrap_reply(result)
}

async fn update_status(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let result = backend.authorized(&headers).and_then(|()| {
        backend.write_guard()?;
        let status = query.get("new_status").cloned().unwrap_or_default();
        Ok(with_job(&backend, &id, |job| job["status"] = Value::String(status)))
    });
    unwrap_reply(result)
}

async fn bulk_status(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(ids): Json<Vec<String>>,
) -> Reply {
    let result = backend.authorized(&headers).and_then(|()| {
        backend.write_guard()?;
        let status = query.get("new_status").cloned().unwrap_or_default();
        let mut updated = 0;
        for job in backend.jobs.lock().unwrap().iter_mut() {
            if job["id"].as_str().is_some_and(|id| ids.iter().any(|i| i == id)) {
                job["status"] = Value::String(status.clone());
                updated += 1;
            }
        }
        Ok(ok(json!({ "message": format!("Updated {updated} jobs to {status}") })))
    });
    unwrap_reply(result)
}

async fn bulk_delete(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(ids): Json<Vec<String>>,
) -> Reply {
    let result = backend.authorized(&headers).and_then(|()| {
        backend.write_guard()?;
        let mut jobs = backend.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|job| !job["id"].as_str().is_some_and(|id| ids.iter().any(|i| i == id)));
        Ok(ok(json!({ "message": format!("Deleted {} jobs", before - jobs.len()) })))
    });
    unwrap_reply(result)
}

async fn job_stats(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Reply {
    unwrap_reply(backend.authorized(&headers).map(|()| {
        let jobs = backend.jobs.lock().unwrap();
        let count = |status: &str| jobs.iter().filter(|job| job["status"] == status).count();
        ok(json!({
            "Applied": count("Applied"),
            "Interview": count("Interview"),
            "Offer": count("Offer"),
            "Rejected": count("Rejected"),
            "total": jobs.len(),
        }))
    }))
}

async fn password_requirements() -> Reply {
    ok(json!({
        "min_length": 8,
        "require_uppercase": true,
        "require_lowercase": true,
        "require_numbers": true,
        "require_symbols": false,
        "description": "At least 8 characters with mixed case and a number",
    }))
}

async fn health() -> Reply {
    ok(json!({ "status": "healthy", "service": "careervault" }))
}

pub fn router(backend: Arc<Backend>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/me", get(me))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/password-requirements", get(password_requirements))
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/stats", get(job_stats))
        .route("/api/jobs/status/{status}", get(jobs_by_status))
        .route("/api/jobs/bulk", axum::routing::delete(bulk_delete))
        .route("/api/jobs/bulk/status-update", post(bulk_status))
        .route(
            "/api/jobs/{id}",
            get(get_job).put(update_job).delete(delete_job),
        )
        .route("/api/jobs/{id}/status", patch(update_status))
        .with_state(backend)
}

/// Serve a fresh backend on an ephemeral port.
pub async fn spawn() -> (Url, Arc<Backend>) {
    let backend = Arc::new(Backend::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(backend.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (Url::parse(&format!("http://{addr}")).unwrap(), backend)
}

/// Context with an in-memory token store pointed at `base_url`.
pub fn context(base_url: &Url, tokens: Arc<MemoryTokenStore>) -> AppContext {
    let config = ClientConfig {
        base_url: base_url.clone(),
        ..ClientConfig::with_defaults()
    };
    let tokens: Arc<dyn TokenStore> = tokens;
    AppContext::with_token_store(&config, tokens).unwrap()
}
