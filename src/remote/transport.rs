// src/remote/transport.rs

//! HTTP transport abstraction.
//!
//! [`RemoteJobClient`](super::RemoteJobClient) builds requests and decodes
//! responses; a [`Transport`] only moves bytes. That split lets request
//! logging be added as a decorator ([`LoggingTransport`]) and lets tests
//! script responses without a server.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{error, info};

use crate::errors::{Result, RunnerError};

#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// JSON body; `None` for GET.
    pub body: Option<String>,
    pub auth: Option<BasicAuth>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>>;

/// Sends one request and returns the raw response.
///
/// Implementations must not retry. Any failure to obtain a response is a
/// `TransportError`.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Every request made through this transport is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RunnerError::TransportError(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let mut builder = match request.method {
                Method::Get => self.client.get(&request.url),
                Method::Post => self.client.post(&request.url),
            };
            builder = builder.header(reqwest::header::CONTENT_TYPE, "application/json");
            if let Some(auth) = &request.auth {
                builder = builder.basic_auth(&auth.username, Some(&auth.password));
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| RunnerError::TransportError(format!("{} {}: {e}", request.method, request.url)))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| RunnerError::TransportError(format!("reading response body: {e}")))?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Decorator that logs every request and its outcome.
#[derive(Debug, Clone)]
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: Transport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Transport> Transport for LoggingTransport<T> {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let method = request.method;
            let url = request.url.clone();
            info!(%method, %url, "sending request");

            let result = self.inner.send(request).await;
            match &result {
                Ok(response) => info!(%method, %url, status = response.status, "received response"),
                Err(err) => error!(%method, %url, error = %err, "request failed"),
            }
            result
        })
    }
}
