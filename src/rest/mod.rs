// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Small JSON-over-HTTP client shared by the network adapters.
//!
//! Wraps a `reqwest` client with a base URL, optional authentication and,
//! when enabled, exponential-backoff retries for transient failures.

pub mod retry;

use anyhow::{Context, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP error with status code for retry logic.
///
/// Preserves the status so callers can decide whether to retry without parsing
/// error strings.
#[derive(Debug, thiserror::Error)]
#[error("HTTP {status}: {message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

/// Credentials sent with every request.
#[derive(Debug, Clone, Default)]
pub enum Auth {
    #[default]
    None,
    /// HTTP basic authentication
    Basic { username: String, password: String },
    /// `Authorization: Token <token>`, as used by `NetBox`
    Token(String),
}

/// REST client bound to one base URL.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: HttpClient,
    base: String,
    auth: Auth,
    retry: bool,
}

impl RestClient {
    /// Build a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the client cannot be built.
    pub fn new(base_url: &str, auth: Auth, timeout: Duration) -> Result<Self> {
        Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
            auth,
            retry: false,
        })
    }

    /// Retry transient failures of GET and DELETE with [`retry::http_backoff`].
    ///
    /// PUT is never retried: `RouterOS` uses it to create entries, so a retry after
    /// a lost response would create a duplicate.
    #[must_use]
    pub fn with_retries(mut self) -> Self {
        self.retry = true;
        self
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Join `path` onto the base URL, keeping any path prefix of the base.
    ///
    /// An empty path yields the base URL itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined string is not a valid URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        let joined = if path.is_empty() {
            self.base.clone()
        } else {
            format!("{}/{}", self.base, path)
        };
        Url::parse(&joined).with_context(|| format!("Invalid URL: {joined}"))
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for non-success statuses, or a transport/decode error.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        self.get_url(url).await
    }

    /// GET an absolute URL (for example a pagination link) and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for non-success statuses, or a transport/decode error.
    pub async fn get_url<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let text = self.execute::<()>(Method::GET, url.clone(), None).await?;
        serde_json::from_str(&text).with_context(|| format!("Failed to decode response from {url}"))
    }

    /// PUT a JSON body to `path`, ignoring the response body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for non-success statuses, or a transport error.
    pub async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path)?;
        self.execute(Method::PUT, url, Some(body)).await.map(|_| ())
    }

    /// DELETE `path`, expecting an empty response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for non-success statuses, or a transport error.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path)?;
        self.execute::<()>(Method::DELETE, url, None).await.map(|_| ())
    }

    async fn execute<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<String> {
        if !self.retry || method == Method::PUT {
            return self.send(method.clone(), url.clone(), body).await;
        }
        let name = format!("{method} {url}");
        retry::with_backoff(retry::http_backoff(), &name, move || {
            self.send(method.clone(), url.clone(), body)
        })
        .await
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<String> {
        debug!(method = %method, url = %url, "REST request");

        let mut request = self.http.request(method.clone(), url.clone());
        request = match &self.auth {
            Auth::None => request,
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::Token(token) => request.header(AUTHORIZATION, format!("Token {token}")),
        };
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {method} {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::Error::new(HttpError { status, message })
                .context(format!("{method} {url}")));
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {method} {url}"))
    }
}
