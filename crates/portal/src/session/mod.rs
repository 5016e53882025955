// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session termination and the host-side effects it drives.

pub mod terminator;

/// A host-side effect of ending a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Drop any credential the host keeps outside the token store.
    ClearCredential,
    /// Show a message to the user.
    Notify(String),
    /// Navigate to the given surface.
    Redirect(String),
}

/// Capability for performing session side effects.
///
/// The host (a UI shell, a CLI) decides what a notice or a redirect means.
/// Calls arrive in order: `ClearCredential`, then `Notify`, then `Redirect`.
pub trait SessionEffects: Send + Sync {
    fn apply(&self, effect: SessionEffect);
}
