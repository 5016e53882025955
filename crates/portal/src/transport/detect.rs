// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// What a completed call says about the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthSignal {
    /// 2xx: hand the response to the caller.
    Ok,
    /// The access token is missing or expired.
    Unauthorized,
    /// Any other failure: pass it through untouched.
    OtherError,
}

impl AuthSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Unauthorized => "unauthorized",
            Self::OtherError => "other_error",
        }
    }
}

impl std::fmt::Display for AuthSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages the backend uses for an expired or absent token, whatever
/// status code it pairs them with.
pub const EXPIRY_MESSAGES: &[&str] = &["jwt expired", "jwt must be provided"];

/// Classify a completed call by status code and body.
///
/// The backend does not always answer 401 for an expired token, so error
/// bodies are also checked for the known expiry messages.
pub fn classify(status: u16, body: &[u8]) -> AuthSignal {
    if (200..300).contains(&status) {
        return AuthSignal::Ok;
    }
    if status == 401 {
        return AuthSignal::Unauthorized;
    }

    let lower = error_message(body).to_lowercase();
    if EXPIRY_MESSAGES.iter().any(|m| lower.contains(m)) {
        return AuthSignal::Unauthorized;
    }

    AuthSignal::OtherError
}

/// Extract a human-readable message from an error body.
///
/// Looks at a JSON `message` (string or list of strings), then `error`,
/// then falls back to the raw body text.
pub fn error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        match value.get("message") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(serde_json::Value::Array(items)) => {
                let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                if !parts.is_empty() {
                    return parts.join("; ");
                }
            }
            _ => {}
        }
        if let Some(s) = value.get("error").and_then(|v| v.as_str()) {
            return s.to_owned();
        }
    }
    String::from_utf8_lossy(body).trim().to_owned()
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
