// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access credential handling: the token store, its session file, the
//! refresh endpoint call, and the single-flight refresh coordinator.
//!
//! The access token is short-lived and carries no client-side expiry. The
//! only way to learn that it expired is a failed call, at which point the
//! coordinator mints a replacement from the backend's refresh cookie.

pub mod coordinator;
pub mod persist;
pub mod refresh;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque bearer access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Body returned by `POST /auth/login` and `POST /auth/login/access-token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub access_token: String,
    #[serde(default)]
    pub user: serde_json::Value,
}

impl AuthPayload {
    pub fn credential(&self) -> Credential {
        Credential::new(self.access_token.clone())
    }
}

/// Result of one refresh attempt, shared by every caller that awaited it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success(Credential),
    Failure(RefreshFailure),
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Why a refresh could not produce a new credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    /// The refresh endpoint answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The refresh endpoint could not be reached.
    Transport(String),
    /// The refresh call did not finish within the configured bound.
    Timeout,
    /// The refresh endpoint answered 2xx with an unreadable body.
    Malformed(String),
    /// The user logged out; nothing is refreshed until the next login.
    SignedOut,
}

impl RefreshFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "REFRESH_REJECTED",
            Self::Transport(_) => "REFRESH_TRANSPORT",
            Self::Timeout => "REFRESH_TIMEOUT",
            Self::Malformed(_) => "REFRESH_MALFORMED",
            Self::SignedOut => "SIGNED_OUT",
        }
    }
}

impl fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status, message } => write!(f, "refresh rejected ({status}): {message}"),
            Self::Transport(e) => write!(f, "refresh unreachable: {e}"),
            Self::Timeout => f.write_str("refresh timed out"),
            Self::Malformed(e) => write!(f, "refresh response malformed: {e}"),
            Self::SignedOut => f.write_str("signed out"),
        }
    }
}

impl std::error::Error for RefreshFailure {}
