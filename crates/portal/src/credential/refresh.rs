// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access-token refresh against `POST /auth/login/access-token`.

use std::future::Future;
use std::pin::Pin;

use crate::credential::{AuthPayload, RefreshFailure};
use crate::transport::detect::error_message;

/// Backend route that mints a new access token from the refresh cookie.
pub const REFRESH_PATH: &str = "/auth/login/access-token";

pub type RefreshFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AuthPayload, RefreshFailure>> + Send + 'a>>;

/// Something that can mint a new access token.
///
/// The coordinator calls this at most once per refresh cycle.
pub trait Refresher: Send + Sync {
    fn refresh(&self) -> RefreshFuture<'_>;
}

/// Refresher backed by the backend's refresh endpoint.
///
/// Shares the client (and therefore the cookie jar) with the dispatcher so
/// the refresh cookie set at login is replayed here.
pub struct HttpRefresher {
    client: reqwest::Client,
    url: String,
}

impl HttpRefresher {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self { client, url: format!("{}{REFRESH_PATH}", base_url.trim_end_matches('/')) }
    }
}

impl Refresher for HttpRefresher {
    fn refresh(&self) -> RefreshFuture<'_> {
        Box::pin(do_refresh(&self.client, &self.url))
    }
}

/// Perform a single refresh request. No retries: a rejected refresh cookie
/// will not get better by asking again.
pub async fn do_refresh(
    client: &reqwest::Client,
    url: &str,
) -> Result<AuthPayload, RefreshFailure> {
    let resp =
        client.post(url).send().await.map_err(|e| RefreshFailure::Transport(e.to_string()))?;

    let status = resp.status();
    let bytes = resp.bytes().await.map_err(|e| RefreshFailure::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(RefreshFailure::Rejected {
            status: status.as_u16(),
            message: error_message(&bytes),
        });
    }

    let payload: AuthPayload =
        serde_json::from_slice(&bytes).map_err(|e| RefreshFailure::Malformed(e.to_string()))?;
    if payload.access_token.is_empty() {
        return Err(RefreshFailure::Malformed("empty accessToken".to_owned()));
    }
    Ok(payload)
}
