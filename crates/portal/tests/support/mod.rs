// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fake of the portal backend: login, refresh, logout, and a few
//! domain resources guarded by the current access token.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;

use portal::credential::Credential;
use portal::test_support::RecordingEffects;
use portal::{AuthenticatedClient, ClientConfig};

pub const PASSWORD: &str = "hunter2";
const REFRESH_COOKIE: &str = "refresh=r-1";

/// How the refresh endpoint behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Succeed,
    Reject,
}

/// Mutable backend state shared with the test body.
pub struct BackendState {
    valid_token: Mutex<String>,
    issued: AtomicU32,
    pub refresh_mode: Mutex<RefreshMode>,
    pub refresh_delay: Mutex<Duration>,
    /// Reject refreshes that do not carry the login cookie.
    pub require_cookie: Mutex<bool>,
    /// Report expiry as `500 {"message":"jwt expired"}` instead of 401.
    pub expiry_as_500: Mutex<bool>,
    /// Answer logout with 503, leaving the refresh cookie valid.
    pub logout_fails: Mutex<bool>,
    /// How long `/slow` holds a request before answering.
    pub slow_delay: Mutex<Duration>,
    pub refresh_calls: AtomicU32,
    pub login_calls: AtomicU32,
    pub logout_calls: AtomicU32,
    /// `(path, bearer token)` for every domain request, in arrival order.
    pub seen: Mutex<Vec<(String, Option<String>)>>,
}

impl BackendState {
    fn new() -> Self {
        Self {
            valid_token: Mutex::new("tok-0".to_owned()),
            issued: AtomicU32::new(0),
            refresh_mode: Mutex::new(RefreshMode::Succeed),
            refresh_delay: Mutex::new(Duration::from_millis(100)),
            require_cookie: Mutex::new(false),
            expiry_as_500: Mutex::new(false),
            logout_fails: Mutex::new(false),
            slow_delay: Mutex::new(Duration::from_millis(300)),
            refresh_calls: AtomicU32::new(0),
            login_calls: AtomicU32::new(0),
            logout_calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn issue(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("tok-{n}");
        *self.valid_token.lock() = token.clone();
        token
    }

    pub fn valid_token(&self) -> String {
        self.valid_token.lock().clone()
    }

    /// Invalidate every outstanding access token.
    pub fn expire(&self) {
        *self.valid_token.lock() = "expired".to_owned();
    }

    pub fn refreshes(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Bearer tokens seen for `path`, in arrival order.
    pub fn tokens_for(&self, path: &str) -> Vec<Option<String>> {
        self.seen.lock().iter().filter(|(p, _)| p == path).map(|(_, t)| t.clone()).collect()
    }
}

pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

/// reqwest is built without a bundled crypto provider.
pub fn install_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

impl FakeBackend {
    pub async fn start() -> anyhow::Result<Self> {
        install_crypto();
        let state = Arc::new(BackendState::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self { base_url: format!("http://{addr}"), state })
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone())
    }

    /// A client already holding the backend's current token.
    pub fn signed_in_client(&self) -> anyhow::Result<(AuthenticatedClient, Arc<RecordingEffects>)> {
        self.signed_in_client_with(self.config())
    }

    pub fn signed_in_client_with(
        &self,
        config: ClientConfig,
    ) -> anyhow::Result<(AuthenticatedClient, Arc<RecordingEffects>)> {
        let effects = RecordingEffects::new();
        let client = AuthenticatedClient::new(&config, effects.clone())?;
        client.store().set(Credential::new(self.state.valid_token()));
        Ok((client, effects))
    }
}

fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/login/access-token", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/broken", get(broken))
        .route("/always-401", get(always_unauthorized))
        .route("/forbidden", get(forbidden))
        .route("/slow", get(slow))
        .route("/{resource}", get(resource).post(resource))
        .with_state(state)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

fn has_refresh_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.split(';').any(|c| c.trim() == REFRESH_COOKIE))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized", "statusCode": 401 })))
        .into_response()
}

fn expired(state: &BackendState) -> Response {
    if *state.expiry_as_500.lock() {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "jwt expired", "statusCode": 500 })),
        )
            .into_response()
    } else {
        unauthorized()
    }
}

async fn login(State(s): State<Arc<BackendState>>, Json(body): Json<serde_json::Value>) -> Response {
    s.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" })))
            .into_response();
    }
    let token = s.issue();
    (
        [(header::SET_COOKIE, format!("{REFRESH_COOKIE}; HttpOnly; Path=/; SameSite=Strict"))],
        Json(json!({ "accessToken": token, "user": { "email": body["email"], "role": "admin" } })),
    )
        .into_response()
}

async fn refresh(State(s): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    s.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *s.refresh_delay.lock();
    tokio::time::sleep(delay).await;

    if *s.refresh_mode.lock() == RefreshMode::Reject {
        return unauthorized();
    }
    if *s.require_cookie.lock() && !has_refresh_cookie(&headers) {
        return unauthorized();
    }
    let token = s.issue();
    Json(json!({ "accessToken": token, "user": { "email": "ops@example.com" } })).into_response()
}

async fn logout(State(s): State<Arc<BackendState>>) -> Response {
    s.logout_calls.fetch_add(1, Ordering::SeqCst);
    if *s.logout_fails.lock() {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "message": "try again later" })))
            .into_response();
    }
    s.expire();
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, "refresh=; Max-Age=0; Path=/")]).into_response()
}

async fn resource(
    State(s): State<Arc<BackendState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = bearer(&headers);
    s.seen.lock().push((format!("/{name}"), token.clone()));
    if token.as_deref() != Some(s.valid_token().as_str()) {
        return expired(&s);
    }
    Json(json!({ "resource": name, "items": [] })).into_response()
}

/// Like a resource, but the token is checked only after `slow_delay`.
async fn slow(State(s): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    let token = bearer(&headers);
    s.seen.lock().push(("/slow".to_owned(), token.clone()));
    let delay = *s.slow_delay.lock();
    tokio::time::sleep(delay).await;
    if token.as_deref() != Some(s.valid_token().as_str()) {
        return expired(&s);
    }
    Json(json!({ "resource": "slow", "items": [] })).into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "database down" }))).into_response()
}

async fn always_unauthorized(State(s): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    s.seen.lock().push(("/always-401".to_owned(), bearer(&headers)));
    unauthorized()
}

async fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "message": "Forbidden resource" }))).into_response()
}
