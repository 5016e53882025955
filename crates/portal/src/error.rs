// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use crate::transport::{ApiResponse, TransportError};

/// Errors that reach application code from [`AuthenticatedClient`].
///
/// Expired tokens and failed refreshes never appear here directly: the
/// client either recovers from them or turns them into
/// [`ClientError::SessionTerminated`].
///
/// [`AuthenticatedClient`]: crate::client::AuthenticatedClient
#[derive(Debug, Clone)]
pub enum ClientError {
    /// The backend could not be reached. The session is untouched.
    Transport(TransportError),
    /// The backend answered with an error unrelated to authentication.
    Http(ApiResponse),
    /// The session ended while this request was outstanding. Not retryable.
    SessionTerminated,
    /// A successful response body did not have the expected shape.
    Decode(String),
}

impl ClientError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::SessionTerminated => "SESSION_TERMINATED",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(resp) => Some(resp.status),
            _ => None,
        }
    }

    pub fn is_session_terminated(&self) -> bool {
        matches!(self, Self::SessionTerminated)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => e.fmt(f),
            Self::Http(resp) => {
                let message = resp.message();
                if message.is_empty() {
                    write!(f, "HTTP {}", resp.status)
                } else {
                    write!(f, "HTTP {}: {message}", resp.status)
                }
            }
            Self::SessionTerminated => f.write_str("session expired, please log in again"),
            Self::Decode(e) => write!(f, "unexpected response body: {e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}
