#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use blog_frontend::{AppConfig, AppState, create_router};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;
use url::Url;

pub const VALID_TOKEN: &str = "valid-token";
pub const VALID_COOKIE: &str = "auth_token=valid-token";

// --- Fake Blog API ---

/// One request as seen by the fake blog API.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub uri: String,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
    pub accept: Vec<String>,
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.uri.starts_with(path))
            .collect()
    }
}

pub struct FakeBackend {
    /// Base URL including the `/api` prefix, as the gateway expects it.
    pub base_url: String,
    pub log: CallLog,
}

async fn record(State(log): State<CallLog>, request: Request, next: Next) -> Response {
    // The borrow of `request` has to end before the await below.
    let call = {
        let header_value = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        RecordedCall {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            cookie: header_value(header::COOKIE),
            content_type: header_value(header::CONTENT_TYPE),
            accept: request
                .headers()
                .get_all(header::ACCEPT)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(str::to_string)
                .collect(),
        }
    };
    log.0.lock().unwrap().push(call);
    next.run(request).await
}

fn is_valid_session(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookie| cookie == VALID_COOKIE)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "missing or invalid token" })),
    )
        .into_response()
}

fn sample_post(id: u64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "content": "Body text",
        "author": "Ada",
        "published": true,
        "created_at": "2025-01-15T10:00:00Z"
    })
}

async fn list_posts(
    headers: axum::http::HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !is_valid_session(&headers) {
        return unauthorized();
    }
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size: u32 = params
        .get("page_size")
        .and_then(|p| p.parse().ok())
        .unwrap_or(10);
    if params.get("q").is_some_and(|q| q == "garbled") {
        return Json(json!({ "unexpected": true })).into_response();
    }
    let title = params
        .get("q")
        .map(|q| format!("Result for {q}"))
        .unwrap_or_else(|| "Hello".to_string());
    Json(json!({
        "items": [sample_post(1, &title)],
        "total": 25,
        "page": page,
        "page_size": page_size
    }))
    .into_response()
}

async fn create_post(headers: axum::http::HeaderMap, Json(body): Json<Value>) -> Response {
    if !is_valid_session(&headers) {
        return unauthorized();
    }
    let title = body["title"].as_str().unwrap_or_default();
    if title == "boom" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "could not create post" })),
        )
            .into_response();
    }
    if title == "silent" {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if title == "garbled" {
        return (StatusCode::CREATED, Json(json!({ "unexpected": true }))).into_response();
    }
    (StatusCode::CREATED, Json(sample_post(42, title))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == "ada@example.com" && body["password"] == "correct-horse" {
        (
            [(
                header::SET_COOKIE,
                format!("auth_token={VALID_TOKEN}; Path=/; HttpOnly; SameSite=Strict"),
            )],
            Json(json!({ "message": "login successful", "user": { "id": 7, "username": "ada" } })),
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid email or password" })),
        )
            .into_response()
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["username"] == "taken" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "username already exists" })),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({ "id": 8, "username": body["username"] })),
    )
        .into_response()
}

async fn logout() -> Response {
    (
        [(header::SET_COOKIE, "auth_token=; Path=/; Max-Age=0")],
        Json(json!({ "message": "logout successful" })),
    )
        .into_response()
}

/// Starts the fake blog API on an ephemeral port.
pub async fn spawn_backend() -> FakeBackend {
    let log = CallLog::default();

    let api = Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/create", post(create_post))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout));

    let router = Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(log.clone(), record));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    FakeBackend {
        base_url: format!("http://127.0.0.1:{port}/api"),
        log,
    }
}

/// A base URL nothing listens on: connections are refused.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/api")
}

// --- Gateway ---

pub fn config_for(base_url: &str) -> AppConfig {
    AppConfig {
        api_base_url: Url::parse(base_url).unwrap(),
        api_timeout: Duration::from_secs(5),
        ..AppConfig::default()
    }
}

/// Starts the gateway in front of `base_url` and returns its address.
pub async fn spawn_gateway(base_url: &str) -> String {
    let state = AppState::new(config_for(base_url)).expect("client builds");
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{port}")
}

/// Browser stand-in that does not follow redirects, so tests can inspect them.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
}
