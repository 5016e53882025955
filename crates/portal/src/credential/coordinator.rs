// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight access-token refresh.
//!
//! Any number of requests may observe an expired token at the same time.
//! The first one starts exactly one refresh call; everyone else, including
//! late arrivals, shares its outcome:
//!
//! ```text
//! Idle ──request_refresh──▶ Refreshing ──success──▶ Idle
//!                               │
//!                               └──failure──▶ Failed ──▶ Idle
//! ```
//!
//! The refresh itself runs on its own task so it completes even when every
//! waiting caller has been dropped. The token store is updated before any
//! waiter is released, so retries always pick up the new credential.
//!
//! After a logout the coordinator refuses to refresh until the next login,
//! and a refresh still in flight at logout time is discarded.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::credential::refresh::Refresher;
use crate::credential::store::TokenStore;
use crate::credential::{Credential, RefreshFailure, RefreshOutcome};
use crate::events::{SessionEvent, SessionEvents};

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Observable coordinator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

enum Phase {
    Idle,
    Refreshing(PendingRefresh),
}

struct State {
    phase: Phase,
    /// Credential the last failed refresh could not replace, and why.
    failed: Option<(Option<Credential>, RefreshFailure)>,
    /// Set by logout, cleared by the next login.
    signed_out: bool,
}

struct Inner {
    store: Arc<TokenStore>,
    refresher: Arc<dyn Refresher>,
    timeout: Duration,
    events: SessionEvents,
    state: Mutex<State>,
}

/// Collapses concurrent refresh requests into one call.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<TokenStore>,
        refresher: Arc<dyn Refresher>,
        timeout: Duration,
        events: SessionEvents,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                refresher,
                timeout,
                events,
                state: Mutex::new(State { phase: Phase::Idle, failed: None, signed_out: false }),
            }),
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        match self.inner.state.lock().phase {
            Phase::Idle => RefreshPhase::Idle,
            Phase::Refreshing(_) => RefreshPhase::Refreshing,
        }
    }

    /// Forget the last failure and any logout. Called after a fresh login.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        state.failed = None;
        state.signed_out = false;
    }

    /// Refuse every refresh until [`reset`](Self::reset). Called on logout.
    ///
    /// Once this returns, no refresh result reaches the token store.
    pub fn sign_out(&self) {
        let mut state = self.inner.state.lock();
        state.signed_out = true;
        state.failed = None;
    }

    /// Obtain a credential newer than `rejected`, the one the caller's
    /// request was sent with.
    ///
    /// - A refresh already in flight is joined, never duplicated.
    /// - If the store already holds a different credential, a refresh
    ///   finished in between and its credential is returned directly.
    /// - If the last refresh already failed to replace `rejected`, that
    ///   failure is returned directly.
    /// - After a logout, [`RefreshFailure::SignedOut`] is returned and no
    ///   refresh is started.
    pub async fn request_refresh(&self, rejected: Option<&Credential>) -> RefreshOutcome {
        let pending = {
            let mut state = self.inner.state.lock();
            if state.signed_out {
                tracing::debug!("signed out, not refreshing");
                return RefreshOutcome::Failure(RefreshFailure::SignedOut);
            }
            let in_flight = match &state.phase {
                Phase::Refreshing(pending) => Some(pending.clone()),
                Phase::Idle => None,
            };
            match in_flight {
                Some(pending) => {
                    tracing::debug!("joining in-flight refresh");
                    pending
                }
                None => {
                    let current = self.inner.store.get();
                    if let Some(current) = current.as_ref() {
                        if rejected != Some(current) {
                            tracing::debug!("credential already replaced, skipping refresh");
                            return RefreshOutcome::Success(current.clone());
                        }
                    }
                    if let Some((target, reason)) = &state.failed {
                        if target.as_ref() == rejected {
                            tracing::debug!("credential already failed to refresh");
                            return RefreshOutcome::Failure(reason.clone());
                        }
                    }

                    let runner = Arc::clone(&self.inner);
                    let task = tokio::spawn(async move { runner.run_refresh(current).await });
                    let inner = Arc::clone(&self.inner);
                    let pending = async move {
                        match task.await {
                            Ok(outcome) => outcome,
                            Err(e) => {
                                // run_refresh never got to leave Refreshing.
                                tracing::warn!(err = %e, "refresh task did not complete");
                                inner.state.lock().phase = Phase::Idle;
                                RefreshOutcome::Failure(RefreshFailure::Transport(format!(
                                    "refresh task aborted: {e}"
                                )))
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    state.phase = Phase::Refreshing(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }
}

impl Inner {
    async fn run_refresh(&self, target: Option<Credential>) -> RefreshOutcome {
        tracing::info!("refreshing access token");

        let result = match tokio::time::timeout(self.timeout, self.refresher.refresh()).await {
            Ok(result) => result,
            Err(_) => Err(RefreshFailure::Timeout),
        };

        // Checked and written under the state lock so it cannot race sign_out.
        let outcome = {
            let mut state = self.state.lock();
            state.phase = Phase::Idle;
            let outcome = if state.signed_out {
                RefreshOutcome::Failure(RefreshFailure::SignedOut)
            } else {
                match result {
                    Ok(payload) => {
                        let credential = payload.credential();
                        self.store.set_session(credential.clone(), payload.user);
                        RefreshOutcome::Success(credential)
                    }
                    Err(reason) => RefreshOutcome::Failure(reason),
                }
            };
            state.failed = match outcome {
                RefreshOutcome::Failure(ref reason) if !state.signed_out => {
                    Some((target, reason.clone()))
                }
                _ => None,
            };
            outcome
        };

        match outcome {
            RefreshOutcome::Success(_) => {
                tracing::info!("access token refreshed");
                self.events.emit(SessionEvent::TokenRefreshed);
            }
            RefreshOutcome::Failure(RefreshFailure::SignedOut) => {
                tracing::debug!("refresh finished after logout, result discarded");
            }
            RefreshOutcome::Failure(ref reason) => {
                tracing::warn!(err = %reason, code = reason.as_str(), "access token refresh failed");
                self.events.emit(SessionEvent::RefreshFailed { reason: reason.to_string() });
            }
        }
        outcome
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
