// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use crate::credential::store::SessionStorage;

/// Configuration for the authenticated portal client.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `https://api.example.com`.
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "PORTAL_BASE_URL")]
    pub base_url: String,

    /// Session file holding the access token between invocations.
    /// If unset, the session lives in memory only.
    #[arg(long, env = "PORTAL_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 30000, env = "PORTAL_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Upper bound on one access-token refresh in milliseconds.
    #[arg(long, default_value_t = 10000, env = "PORTAL_REFRESH_TIMEOUT_MS")]
    pub refresh_timeout_ms: u64,

    /// Surface to redirect to when the session ends.
    #[arg(long, default_value = "/login", env = "PORTAL_LOGIN_ROUTE")]
    pub login_route: String,
}

impl ClientConfig {
    /// Config for `base_url` with all other settings at their defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_file: None,
            request_timeout_ms: 30000,
            refresh_timeout_ms: 10000,
            login_route: "/login".to_owned(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    pub fn storage(&self) -> SessionStorage {
        match self.session_file {
            Some(ref path) => SessionStorage::File(path.clone()),
            None => SessionStorage::Memory,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            anyhow::bail!("--base-url must start with http:// or https://");
        }
        if self.request_timeout_ms == 0 {
            anyhow::bail!("--request-timeout-ms must be greater than zero");
        }
        if self.refresh_timeout_ms == 0 {
            anyhow::bail!("--refresh-timeout-ms must be greater than zero");
        }
        if !self.login_route.starts_with('/') {
            anyhow::bail!("--login-route must be an absolute path");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
