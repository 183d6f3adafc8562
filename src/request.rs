use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{ApiError, Result};

/// Describes one outgoing API call.
///
/// The descriptor is rebuilt into a fresh `reqwest` request on every attempt,
/// so resends after a 429 or a transport failure dispatch an identical call.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the client's base URL; must start with `/`.
    pub path: String,
    /// JSON body, serialized on each attempt.
    pub body: Option<JsonValue>,
    /// Extra headers beyond authorization and content type.
    pub headers: Vec<(String, String)>,
    /// Per-request timeout override in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            timeout_ms: None,
        }
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

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attaches a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|err| ApiError::Decode(format!("request body serialization: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Per-call retry bookkeeping for transport failures.
///
/// Created at the start of each `send` and never shared across calls. The
/// counter can reach `max_retries` but never exceed it; once the budget is
/// spent the failure is surfaced unchanged.
#[derive(Debug)]
pub(crate) struct RetryContext {
    attempts: u32,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryContext {
    pub(crate) fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_retries,
            base_delay,
        }
    }

    /// Consumes one retry and returns the linear backoff for it, or `None`
    /// when the budget is exhausted.
    pub(crate) fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_retries {
            return None;
        }
        self.attempts += 1;
        Some(self.base_delay.saturating_mul(self.attempts))
    }

    #[cfg(any(test, feature = "tracing"))]
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    #[cfg(feature = "tracing")]
    pub(crate) fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
