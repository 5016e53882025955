// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: fakes for the refresh endpoint and the
//! session side effects, plus assertion helpers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::credential::refresh::{RefreshFuture, Refresher};
use crate::credential::{AuthPayload, RefreshFailure};
use crate::session::{SessionEffect, SessionEffects};

/// A refresher that replays scripted outcomes and counts its calls.
///
/// Once the script is exhausted every call is rejected with a 401.
pub struct ScriptedRefresher {
    calls: AtomicU32,
    delay: Duration,
    script: parking_lot::Mutex<VecDeque<Result<AuthPayload, RefreshFailure>>>,
}

impl ScriptedRefresher {
    pub fn new(script: Vec<Result<AuthPayload, RefreshFailure>>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            delay: Duration::ZERO,
            script: parking_lot::Mutex::new(script.into()),
        }
    }

    /// Every call yields a fresh token `token`.
    pub fn succeeding(token: &str) -> Self {
        Self::new(vec![Ok(payload(token))])
    }

    /// Every call is rejected.
    pub fn rejecting() -> Self {
        Self::new(vec![])
    }

    /// Hold each call open for `delay` before answering.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Refresher for ScriptedRefresher {
    fn refresh(&self) -> RefreshFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut script = self.script.lock();
            // A single scripted success is reused for every call.
            if script.len() == 1 && matches!(script.front(), Some(Ok(_))) {
                script.front().cloned()
            } else {
                script.pop_front()
            }
        };
        let delay = self.delay;
        Box::pin(async move {
            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }
            next.unwrap_or_else(|| {
                Err(RefreshFailure::Rejected { status: 401, message: "jwt expired".to_owned() })
            })
        })
    }
}

/// Build a login/refresh payload for `token`.
pub fn payload(token: &str) -> AuthPayload {
    AuthPayload {
        access_token: token.to_owned(),
        user: serde_json::json!({ "email": "dispatch@example.com" }),
    }
}

/// Records every session side effect instead of performing it.
#[derive(Default)]
pub struct RecordingEffects {
    applied: parking_lot::Mutex<Vec<SessionEffect>>,
}

impl RecordingEffects {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn effects(&self) -> Vec<SessionEffect> {
        self.applied.lock().clone()
    }

    pub fn notices(&self) -> usize {
        self.applied.lock().iter().filter(|e| matches!(e, SessionEffect::Notify(_))).count()
    }

    pub fn redirects(&self) -> usize {
        self.applied.lock().iter().filter(|e| matches!(e, SessionEffect::Redirect(_))).count()
    }

    pub fn clears(&self) -> usize {
        self.applied.lock().iter().filter(|e| matches!(e, SessionEffect::ClearCredential)).count()
    }
}

impl SessionEffects for RecordingEffects {
    fn apply(&self, effect: SessionEffect) {
        self.applied.lock().push(effect);
    }
}

/// Assert that an expression returns `Err` whose `Display` contains a substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
