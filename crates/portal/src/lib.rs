// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Portal: authenticated request layer for the logistics portal backend.
//!
//! Every call carries the short-lived access token. When the backend says
//! the token expired, one refresh is performed no matter how many requests
//! noticed, each affected request is retried once, and if the refresh
//! itself fails the session ends exactly once.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod session;
pub mod test_support;
pub mod transport;

pub use client::AuthenticatedClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use transport::RequestDescriptor;
