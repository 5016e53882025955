// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound HTTP: request descriptors, the bearer-attaching dispatcher, and
//! the auth-signal classifier for completed calls.

pub mod detect;
pub mod dispatcher;

use std::fmt;

use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;

/// An outbound call, independent of any credential.
///
/// Descriptors are immutable; a retry resubmits the same descriptor with a
/// different [`Attempt`].
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), headers: Vec::new(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body and its content type.
    pub fn json(self, body: &serde_json::Value) -> Self {
        let bytes = Bytes::from(body.to_string());
        let mut req = self.header("content-type", "application/json");
        req.body = Some(bytes);
        req
    }
}

/// Which submission of a descriptor this is. A descriptor is retried at
/// most once, after a successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retry,
}

impl Attempt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Retry => "retry",
        }
    }
}

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        if self.body.is_empty() {
            return serde_json::from_value(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.body)
    }

    /// Best-effort error message from the body.
    pub fn message(&self) -> String {
        detect::error_message(&self.body)
    }
}

/// The call never produced an HTTP response.
///
/// Never a reason to refresh or end the session: the backend may simply be
/// unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, network unreachable.
    Connect(String),
    Timeout,
    /// The request could not be built (bad URL, bad header).
    Request(String),
    Other(String),
}

impl TransportError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect(_) => "CONNECT",
            Self::Timeout => "TIMEOUT",
            Self::Request(_) => "REQUEST",
            Self::Other(_) => "TRANSPORT",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() {
            Self::Request(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "backend unreachable: {e}"),
            Self::Timeout => f.write_str("request timed out"),
            Self::Request(e) => write!(f, "invalid request: {e}"),
            Self::Other(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}
