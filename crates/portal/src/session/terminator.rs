// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::credential::store::TokenStore;
use crate::credential::Credential;
use crate::events::{SessionEvent, SessionEvents};
use crate::session::{SessionEffect, SessionEffects};

/// Notice shown once when the session cannot be renewed.
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";

/// Ends the session when the access token can no longer be replaced.
///
/// Any number of failed requests may call [`terminate`](Self::terminate)
/// concurrently; the notice and the redirect happen once per session.
/// The latch is re-armed only by [`reset`](Self::reset) after a login.
pub struct SessionTerminator {
    store: Arc<TokenStore>,
    effects: Arc<dyn SessionEffects>,
    events: SessionEvents,
    login_route: String,
    ended: AtomicBool,
}

impl SessionTerminator {
    pub fn new(
        store: Arc<TokenStore>,
        effects: Arc<dyn SessionEffects>,
        events: SessionEvents,
        login_route: impl Into<String>,
    ) -> Self {
        Self { store, effects, events, login_route: login_route.into(), ended: AtomicBool::new(false) }
    }

    /// Terminate after a failed refresh of `rejected`, the credential the
    /// failed request was sent with. Returns `true` for the one call that
    /// showed the notice and redirected.
    ///
    /// If the store already holds a different credential, a newer session
    /// exists and is left alone.
    pub fn terminate(&self, rejected: Option<&Credential>) -> bool {
        if let Some(current) = self.store.get() {
            if rejected != Some(&current) {
                tracing::debug!("store holds a newer credential, keeping session");
                return false;
            }
        }
        self.clear();
        if self.ended.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            tracing::debug!("session already ended");
            return false;
        }

        tracing::warn!("session expired, redirecting to login");
        self.effects.apply(SessionEffect::Notify(SESSION_EXPIRED_NOTICE.to_owned()));
        self.effects.apply(SessionEffect::Redirect(self.login_route.clone()));
        self.events.emit(SessionEvent::SessionExpired);
        true
    }

    /// End the session on user request: clear and redirect, no notice.
    pub fn end_session(&self) {
        self.clear();
        self.ended.store(true, Ordering::Release);
        self.effects.apply(SessionEffect::Redirect(self.login_route.clone()));
    }

    /// Re-arm the once-per-session latch. Called after a successful login.
    pub fn reset(&self) {
        self.ended.store(false, Ordering::Release);
    }

    /// Whether the current session has already ended.
    pub fn has_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.store.clear();
        self.effects.apply(SessionEffect::ClearCredential);
    }
}

#[cfg(test)]
#[path = "terminator_tests.rs"]
mod tests;
