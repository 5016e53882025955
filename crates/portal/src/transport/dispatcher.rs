// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP dispatcher: attaches the current access token and performs the call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::credential::store::TokenStore;
use crate::credential::Credential;
use crate::transport::{ApiResponse, RequestDescriptor, TransportError};

/// Build the HTTP client shared by the dispatcher and the refresher.
///
/// The cookie store carries the backend's HTTP-only refresh cookie from
/// login to refresh and logout.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).cookie_store(true).build()
}

/// A response together with the credential it was sent with.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub response: ApiResponse,
    pub credential: Option<Credential>,
}

/// Sends request descriptors to the backend.
///
/// Interprets nothing about the response beyond separating transport
/// failures from HTTP answers.
pub struct RequestDispatcher {
    base_url: String,
    store: Arc<TokenStore>,
    client: Client,
}

impl RequestDispatcher {
    pub fn new(base_url: &str, store: Arc<TokenStore>, client: Client) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_owned(), store, client }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send with whatever credential the store holds right now.
    pub async fn execute(&self, req: &RequestDescriptor) -> Result<Dispatched, TransportError> {
        let credential = self.store.get();
        let response = self.send(req, credential.as_ref()).await?;
        Ok(Dispatched { response, credential })
    }

    /// Send without a bearer header (login).
    pub async fn execute_anonymous(
        &self,
        req: &RequestDescriptor,
    ) -> Result<ApiResponse, TransportError> {
        self.send(req, None).await
    }

    async fn send(
        &self,
        req: &RequestDescriptor,
        credential: Option<&Credential>,
    ) -> Result<ApiResponse, TransportError> {
        let mut builder = self.client.request(req.method.clone(), self.url(&req.path));
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential.as_str());
        }
        if let Some(ref body) = req.body {
            builder = builder.body(body.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        Ok(ApiResponse { status, body })
    }
}
