//! Driven port for issuing HTTP requests against the backend API.
//!
//! The domain owns the request and response shapes so the gateway and the
//! session store can be exercised against a scripted transport without a
//! network.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::AccessToken;

use super::define_port_error;

/// HTTP verbs used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Correlation identifier, sent as `X-Request-Id`.
    pub request_id: Uuid,
    /// Verb.
    pub method: HttpMethod,
    /// Path relative to the API base URL, without a leading `/`.
    pub path: String,
    /// Query pairs in order.
    pub query: Vec<(String, String)>,
    /// Bearer credential, when the caller is authenticated.
    pub bearer: Option<AccessToken>,
    /// JSON body.
    pub body: Option<Value>,
}

impl TransportRequest {
    /// Build a request with a fresh correlation id and no credential.
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            path: path.trim_start_matches('/').to_owned(),
            query: Vec::new(),
            bearer: None,
            body: None,
        }
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response received from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Failures where no HTTP response was received.
    pub enum TransportError {
        /// The request exceeded the configured timeout.
        Timeout { message: String } => "request timed out: {message}",
        /// The connection could not be established or was interrupted.
        Connection { message: String } => "connection failed: {message}",
    }
}

/// Sends requests to the backend API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return whatever status the server answered with.
    async fn send(&self, request: &TransportRequest)
    -> Result<TransportResponse, TransportError>;
}
