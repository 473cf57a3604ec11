//! HTTP transport to the analytics backend
//!
//! One attempt per call, timeout chosen by the caller. Every failure comes
//! back as an [`ApiError`]; nothing panics past this boundary.

use crate::error::{ApiError, ApiResult, Failure};
use crate::endpoints::Method;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Backend round trips, injected into the panel controllers
pub trait Transport: Send + Sync {
    fn get(&self, path: &str, timeout: Duration) -> ApiResult<Value>;

    fn post(&self, path: &str, body: Option<&Value>, timeout: Duration) -> ApiResult<Value>;

    fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> ApiResult<Value> {
        match method {
            Method::Get => self.get(path, timeout),
            Method::Post => self.post(path, body, timeout),
        }
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tunelens/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, method: Method, path: &str, request: RequestBuilder) -> ApiResult<Value> {
        log::debug!("{} {}", method, path);
        let result = execute(request);
        if let Err(e) = &result {
            log::warn!("{} {} failed: {}", method, path, e);
        }
        result
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, timeout: Duration) -> ApiResult<Value> {
        let request = self.client.get(self.url(path)).timeout(timeout);
        self.send(Method::Get, path, request)
    }

    fn post(&self, path: &str, body: Option<&Value>, timeout: Duration) -> ApiResult<Value> {
        let empty = Value::Object(serde_json::Map::new());
        let request = self
            .client
            .post(self.url(path))
            .json(body.unwrap_or(&empty))
            .timeout(timeout);
        self.send(Method::Post, path, request)
    }
}

fn execute(request: RequestBuilder) -> ApiResult<Value> {
    let response = request.send().map_err(|e| failure_from(&e).resolve())?;

    let status = response.status();
    if !status.is_success() {
        let body = match response.text() {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return Err(ApiError::Timeout),
            Err(_) => String::new(),
        };
        let failure = Failure::from_response(status.as_u16(), status.canonical_reason(), &body);
        return Err(failure.resolve());
    }

    let body = response.bytes().map_err(|e| failure_from(&e).resolve())?;
    serde_json::from_slice(&body)
        .map_err(|e| ApiError::Decode(format!("body is not valid JSON: {}", e)))
}

fn failure_from(e: &reqwest::Error) -> Failure {
    if e.is_timeout() {
        return Failure::timeout();
    }
    if e.is_connect() {
        return Failure::unreachable();
    }
    // Sent but the exchange broke off (reset, bad framing, ...)
    Failure {
        connected: true,
        status: e.status().map(|s| s.as_u16()),
        ..Failure::default()
    }
}
