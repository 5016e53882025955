// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session file: load/save the active session to JSON with atomic writes.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Active session as written to the session file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub user: serde_json::Value,
}

/// Load the session file.
pub fn load(path: &Path) -> anyhow::Result<PersistedSession> {
    let contents = std::fs::read_to_string(path)?;
    let session: PersistedSession = serde_json::from_str(&contents)?;
    Ok(session)
}

/// Save the session file atomically (write tmp + rename).
///
/// The temp name carries PID + counter so two concurrent saves never share
/// a `.tmp` file.
pub fn save(path: &Path, session: &PersistedSession) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(session)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;

    // Access tokens are bearer secrets.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Remove the session file. A missing file is not an error.
pub fn remove(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
