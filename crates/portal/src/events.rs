// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle events fanned out to every interested surface.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Session lifecycle changes, as seen by any subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A fresh login succeeded.
    LoggedIn,
    /// The access token was replaced by the refresh endpoint.
    TokenRefreshed,
    /// The refresh endpoint could not mint a new token.
    RefreshFailed { reason: String },
    /// The session ended because the token could not be replaced.
    SessionExpired,
    /// The user logged out.
    LoggedOut,
}

/// Broadcast hub for [`SessionEvent`]s.
#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
