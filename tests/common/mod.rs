// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use second_innings_admin::config::Config;
use second_innings_admin::storage::KeyValueStore;
use second_innings_admin::AdminContext;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request seen by the stub backend.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedRequest {
    pub method: String,
    /// Path without the query string
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: u16,
    body: String,
    delay: Duration,
}

#[derive(Default)]
struct StubState {
    routes: Mutex<HashMap<(String, String), CannedResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Backend stand-in served on an ephemeral local port.
///
/// Unregistered routes answer 404 with an empty body.
#[derive(Clone)]
pub struct StubBackend {
    pub addr: SocketAddr,
    state: Arc<StubState>,
}

#[allow(dead_code)]
impl StubBackend {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr = listener.local_addr().expect("Stub backend has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Stub backend failed");
        });

        Self { addr, state }
    }

    /// Answer `method path` (path includes the `/api` prefix) with JSON.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, &body.to_string());
    }

    pub fn respond_raw(&self, method: &str, path: &str, status: u16, body: &str) {
        self.insert(method, path, status, body.to_string(), Duration::ZERO);
    }

    /// Like [`respond`](Self::respond), but hold the answer for `delay`.
    ///
    /// The response is chosen when the request arrives, so re-registering
    /// the route afterwards does not affect a request already waiting.
    pub fn respond_delayed(
        &self,
        method: &str,
        path: &str,
        status: u16,
        body: Value,
        delay: Duration,
    ) {
        self.insert(method, path, status, body.to_string(), delay);
    }

    fn insert(&self, method: &str, path: &str, status: u16, body: String, delay: Duration) {
        self.state.routes.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            CannedResponse {
                status,
                body,
                delay,
            },
        );
    }

    /// Wait until `count` requests to `method path` have arrived.
    pub async fn wait_for_requests(&self, method: &str, path: &str, count: usize) {
        while self.requests_to(method, path).len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests made to `method path`.
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Test-mode config pointing at this backend.
    pub fn config(&self) -> Config {
        Config {
            api_base_url: self.base_url(),
            ..Config::test_default()
        }
    }

    /// Context in test mode with in-memory storage.
    pub fn context(&self) -> AdminContext {
        self.context_with_storage(KeyValueStore::in_memory())
    }

    pub fn context_with_storage(&self, storage: KeyValueStore) -> AdminContext {
        AdminContext::with_storage(self.config(), storage).expect("Failed to build context")
    }
}

async fn handle(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        body: serde_json::from_slice(&body).ok(),
    };
    state.requests.lock().unwrap().push(recorded);

    let canned = state
        .routes
        .lock()
        .unwrap()
        .get(&(method.to_string(), path))
        .cloned();

    if let Some(delay) = canned.as_ref().map(|c| c.delay).filter(|d| !d.is_zero()) {
        tokio::time::sleep(delay).await;
    }

    match canned {
        Some(canned) => (
            StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            [(header::CONTENT_TYPE, "application/json")],
            canned.body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Config whose backend refuses connections.
#[allow(dead_code)]
pub fn unreachable_config() -> Config {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    Config {
        api_base_url: format!("http://{addr}"),
        ..Config::test_default()
    }
}

/// `{data: {user: ...}}` for a test user record.
#[allow(dead_code)]
pub fn user_envelope(user: Value) -> Value {
    serde_json::json!({ "message": "ok", "data": { "user": user } })
}
