// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token store: the single owner of the current access credential.

use std::path::PathBuf;

use parking_lot::RwLock;

use crate::credential::persist::{self, PersistedSession};
use crate::credential::Credential;

/// Where the store mirrors its value between process restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStorage {
    /// Nothing survives the process.
    Memory,
    /// A session file, removed again when the session ends.
    File(PathBuf),
}

#[derive(Default)]
struct Slot {
    credential: Option<Credential>,
    user: serde_json::Value,
}

/// Holds the current access credential and the user it belongs to.
///
/// Reads never touch storage; the session file is read once at construction
/// and written through on every change. Storage failures degrade to "not
/// authenticated" and are only logged.
pub struct TokenStore {
    storage: SessionStorage,
    slot: RwLock<Slot>,
}

impl TokenStore {
    /// Create an empty in-memory store.
    pub fn in_memory() -> Self {
        Self { storage: SessionStorage::Memory, slot: RwLock::new(Slot::default()) }
    }

    /// Open a store, seeding it from the session file if one is readable.
    pub fn open(storage: SessionStorage) -> Self {
        let slot = match storage {
            SessionStorage::Memory => Slot::default(),
            SessionStorage::File(ref path) if !path.exists() => Slot::default(),
            SessionStorage::File(ref path) => match persist::load(path) {
                Ok(session) => Slot {
                    credential: Some(Credential::new(session.access_token)),
                    user: session.user,
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), err = %e, "session file unreadable, starting signed out");
                    Slot::default()
                }
            },
        };
        Self { storage, slot: RwLock::new(slot) }
    }

    pub fn get(&self) -> Option<Credential> {
        self.slot.read().credential.clone()
    }

    /// User object returned alongside the last credential.
    pub fn user(&self) -> serde_json::Value {
        self.slot.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.slot.read().credential.is_some()
    }

    /// Replace the credential, keeping the known user.
    pub fn set(&self, credential: Credential) {
        let mut slot = self.slot.write();
        slot.credential = Some(credential);
        self.write_through(&slot);
    }

    /// Replace both credential and user (login and refresh responses).
    pub fn set_session(&self, credential: Credential, user: serde_json::Value) {
        let mut slot = self.slot.write();
        slot.credential = Some(credential);
        if !user.is_null() {
            slot.user = user;
        }
        self.write_through(&slot);
    }

    /// Forget the credential and user. Idempotent.
    pub fn clear(&self) {
        let mut slot = self.slot.write();
        *slot = Slot::default();
        if let SessionStorage::File(ref path) = self.storage {
            if let Err(e) = persist::remove(path) {
                tracing::warn!(path = %path.display(), err = %e, "failed to remove session file");
            }
        }
    }

    // Called with the write lock held so file order matches memory order.
    fn write_through(&self, slot: &Slot) {
        let SessionStorage::File(ref path) = self.storage else {
            return;
        };
        let Some(ref credential) = slot.credential else {
            return;
        };
        let session = PersistedSession {
            access_token: credential.as_str().to_owned(),
            user: slot.user.clone(),
        };
        if let Err(e) = persist::save(path, &session) {
            tracing::warn!(path = %path.display(), err = %e, "failed to persist session");
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
