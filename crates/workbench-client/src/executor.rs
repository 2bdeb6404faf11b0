//! Request executor
//!
//! Issues exactly one network call and normalizes whatever happens into an
//! [`Envelope`]. Nothing raised by the transport ever crosses `execute`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use workbench_interfaces::{Envelope, FailureKind};

use crate::config::ClientConfig;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::session::SessionStore;

/// HTTP methods used by the operation library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executes one request against the compute backend.
///
/// Contract: never fails. Transport faults, non-2xx answers and unparseable
/// bodies all come back as [`Envelope::Failure`].
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, method: Method, locator: &str, payload: Option<Value>) -> Envelope<Value>;
}

/// reqwest-backed executor
#[derive(Clone)]
pub struct HttpExecutor {
    client: Client,
    session: Arc<dyn SessionStore>,
}

impl fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpExecutor").finish_non_exhaustive()
    }
}

impl HttpExecutor {
    /// Creates an executor with the given request timeout
    pub fn new(timeout: Duration, session: Arc<dyn SessionStore>) -> WorkbenchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkbenchError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, session })
    }

    /// Creates an executor from the client configuration
    pub fn from_config(config: &ClientConfig, session: Arc<dyn SessionStore>) -> WorkbenchResult<Self> {
        Self::new(Duration::from_secs(config.timeout_secs), session)
    }

    /// Maps a transport error into the envelope's error channel
    fn map_http_error(error: reqwest::Error) -> Envelope<Value> {
        let status = error.status().map(|s| s.as_u16()).unwrap_or(workbench_interfaces::NO_STATUS);
        let message = if error.is_timeout() {
            format!("Request timeout: {}", error)
        } else if error.is_connect() {
            format!("Connection error: {}", error)
        } else {
            format!("HTTP error: {}", error)
        };
        Envelope::failure(status, FailureKind::Transport, message)
    }
}

/// Extracts a human readable reason from an error body
pub(crate) fn normalize_error(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        for key in ["detail", "error", "message"] {
            match value.get(key) {
                Some(Value::String(reason)) => return reason.clone(),
                Some(Value::Object(inner)) => {
                    if let Some(Value::String(reason)) = inner.get("error") {
                        return reason.clone();
                    }
                    return Value::Object(inner.clone()).to_string();
                }
                Some(Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error: {}", status))
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    #[instrument(skip(self, payload), fields(method = %method, locator = %locator))]
    async fn execute(&self, method: Method, locator: &str, payload: Option<Value>) -> Envelope<Value> {
        let mut request = match method {
            Method::Get => self.client.get(locator),
            Method::Post => self.client.post(locator),
        };

        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(payload) = &payload {
            request = request.json(payload);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request failed before a response arrived: {}", e);
                return Self::map_http_error(e);
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = status.as_u16(), "Failed to read response body: {}", e);
                return Envelope::failure(
                    status.as_u16(),
                    FailureKind::Transport,
                    format!("Failed to read response body: {}", e),
                );
            }
        };

        if !status.is_success() {
            let reason = normalize_error(status, &body);
            debug!(status = status.as_u16(), "Backend rejected request: {}", reason);
            return Envelope::failure(status.as_u16(), FailureKind::Rejected, reason);
        }

        if body.is_empty() {
            return Envelope::success(status.as_u16(), Value::Null);
        }

        match serde_json::from_slice::<Value>(&body) {
            Ok(res) => {
                debug!(status = status.as_u16(), "Request completed");
                Envelope::success(status.as_u16(), res)
            }
            Err(e) => {
                warn!(status = status.as_u16(), "Malformed response body: {}", e);
                Envelope::failure(
                    status.as_u16(),
                    FailureKind::Malformed,
                    format!("Failed to parse response: {}", e),
                )
            }
        }
    }
}
