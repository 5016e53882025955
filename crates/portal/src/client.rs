// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated client: the one entry point for backend calls.
//!
//! Request lifecycle:
//!
//! ```text
//! Sending ──ok / other error──▶ Done
//!    │
//!    └──unauthorized──▶ NeedsRefresh ──refresh failed──▶ Terminated
//!                            │
//!                            └──refreshed──▶ Retrying ──▶ Done
//!                                               │
//!                                               └──unauthorized──▶ Terminated
//! ```
//!
//! A request is resubmitted at most once, and only after the shared refresh
//! succeeded. Transport failures are returned as-is and never touch the
//! session.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::ClientConfig;
use crate::credential::coordinator::{RefreshCoordinator, RefreshPhase};
use crate::credential::refresh::{HttpRefresher, Refresher};
use crate::credential::store::TokenStore;
use crate::credential::{AuthPayload, RefreshFailure, RefreshOutcome};
use crate::error::ClientError;
use crate::events::{SessionEvent, SessionEvents};
use crate::session::terminator::SessionTerminator;
use crate::session::SessionEffects;
use crate::transport::detect::{classify, AuthSignal};
use crate::transport::dispatcher::{http_client, RequestDispatcher};
use crate::transport::{ApiResponse, Attempt, RequestDescriptor};

/// Backend route for email/password login.
pub const LOGIN_PATH: &str = "/auth/login";
/// Backend route that invalidates the refresh cookie.
pub const LOGOUT_PATH: &str = "/auth/logout";

struct ClientInner {
    store: Arc<TokenStore>,
    dispatcher: RequestDispatcher,
    coordinator: RefreshCoordinator,
    terminator: SessionTerminator,
    events: SessionEvents,
}

/// Backend client that keeps the session alive across token expiry.
///
/// Cheap to clone; every clone shares one token store, one refresh
/// coordinator and one terminator. Construct once and hand it out.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<ClientInner>,
}

impl AuthenticatedClient {
    /// Build a client talking to `config.base_url`.
    pub fn new(
        config: &ClientConfig,
        effects: Arc<dyn SessionEffects>,
    ) -> Result<Self, ClientError> {
        let http = http_client(config.request_timeout())
            .map_err(|e| ClientError::Transport(e.into()))?;
        let store = Arc::new(TokenStore::open(config.storage()));
        let refresher = Arc::new(HttpRefresher::new(http.clone(), &config.base_url));
        Ok(Self::from_parts(config, store, http, refresher, effects))
    }

    /// Build a client from explicit collaborators.
    pub fn from_parts(
        config: &ClientConfig,
        store: Arc<TokenStore>,
        http: reqwest::Client,
        refresher: Arc<dyn Refresher>,
        effects: Arc<dyn SessionEffects>,
    ) -> Self {
        let events = SessionEvents::new();
        let dispatcher = RequestDispatcher::new(&config.base_url, Arc::clone(&store), http);
        let coordinator = RefreshCoordinator::new(
            Arc::clone(&store),
            refresher,
            config.refresh_timeout(),
            events.clone(),
        );
        let terminator = SessionTerminator::new(
            Arc::clone(&store),
            effects,
            events.clone(),
            config.login_route.clone(),
        );
        Self {
            inner: Arc::new(ClientInner { store, dispatcher, coordinator, terminator, events }),
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    pub fn refresh_phase(&self) -> RefreshPhase {
        self.inner.coordinator.phase()
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Send a request, refreshing the access token once if it expired.
    pub async fn send(&self, req: &RequestDescriptor) -> Result<ApiResponse, ClientError> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::debug_span!(
            "request",
            %request_id,
            method = %req.method,
            path = %req.path,
        );
        self.run(req).instrument(span).await
    }

    /// Send a request and decode a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        req: &RequestDescriptor,
    ) -> Result<T, ClientError> {
        let resp = self.send(req).await?;
        resp.json().map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `GET path` decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send_json(&RequestDescriptor::get(path)).await
    }

    /// `POST path` with a JSON body, decoded as JSON.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ClientError> {
        self.send_json(&RequestDescriptor::post(path).json(body)).await
    }

    async fn run(&self, req: &RequestDescriptor) -> Result<ApiResponse, ClientError> {
        let mut attempt = Attempt::First;
        loop {
            let dispatched = self.inner.dispatcher.execute(req).await?;
            let status = dispatched.response.status;
            let signal = classify(status, &dispatched.response.body);
            tracing::debug!(status, signal = %signal, attempt = attempt.as_str(), "response");

            match (signal, attempt) {
                (AuthSignal::Ok, _) => return Ok(dispatched.response),
                (AuthSignal::OtherError, _) => return Err(ClientError::Http(dispatched.response)),
                (AuthSignal::Unauthorized, Attempt::Retry) => {
                    // Never a second refresh cycle for the same request.
                    tracing::warn!(status, "request unauthorized after refresh");
                    return Err(ClientError::SessionTerminated);
                }
                (AuthSignal::Unauthorized, Attempt::First) => {
                    match self.inner.coordinator.request_refresh(dispatched.credential.as_ref()).await
                    {
                        RefreshOutcome::Success(_) => {
                            tracing::debug!("token refreshed, retrying");
                            attempt = Attempt::Retry;
                        }
                        RefreshOutcome::Failure(RefreshFailure::SignedOut) => {
                            // The logout already ended the session.
                            tracing::debug!("unauthorized after logout");
                            return Err(ClientError::SessionTerminated);
                        }
                        RefreshOutcome::Failure(reason) => {
                            tracing::debug!(err = %reason, "refresh failed, ending session");
                            self.inner.terminator.terminate(dispatched.credential.as_ref());
                            return Err(ClientError::SessionTerminated);
                        }
                    }
                }
            }
        }
    }

    /// Log in with email and password.
    ///
    /// Bypasses the refresh flow entirely: a rejected login is an ordinary
    /// [`ClientError::Http`].
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        let req = RequestDescriptor::post(LOGIN_PATH)
            .json(&serde_json::json!({ "email": email, "password": password }));
        let resp = self.inner.dispatcher.execute_anonymous(&req).await?;
        if !resp.is_success() {
            tracing::debug!(status = resp.status, "login rejected");
            return Err(ClientError::Http(resp));
        }

        let payload: AuthPayload = resp.json().map_err(|e| ClientError::Decode(e.to_string()))?;
        self.inner.store.set_session(payload.credential(), payload.user.clone());
        self.inner.coordinator.reset();
        self.inner.terminator.reset();
        self.inner.events.emit(SessionEvent::LoggedIn);
        tracing::info!("logged in");
        Ok(payload)
    }

    /// Log out: invalidate the refresh cookie, then end the session locally.
    ///
    /// The local session ends even if the backend cannot be reached, and no
    /// refresh can revive it before the next [`login`](Self::login).
    pub async fn logout(&self) {
        self.inner.coordinator.sign_out();
        match self.inner.dispatcher.execute(&RequestDescriptor::post(LOGOUT_PATH)).await {
            Ok(d) if d.response.is_success() => {}
            Ok(d) => tracing::warn!(status = d.response.status, "logout rejected by backend"),
            Err(e) => tracing::warn!(err = %e, "logout request failed"),
        }
        self.inner.terminator.end_session();
        self.inner.events.emit(SessionEvent::LoggedOut);
        tracing::info!("logged out");
    }
}
