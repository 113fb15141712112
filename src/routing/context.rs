use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

use crate::services::auth::AuthContext;

/// Coarse dispatcher verdict on a protected route.
pub const REASON_HEADER: &str = "x-gate-reason";
/// Specific reason reported by the token authenticator.
pub const AUTH_REASON_HEADER: &str = "x-gate-auth-reason";

/// What the transport hands to [`Dispatcher::dispatch`](super::Dispatcher::dispatch).
///
/// `method` and `uri` are optional because their absence is a distinct
/// failure, not a routing miss.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub method: Option<String>,
    pub uri: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RawRequest {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    /// Invalid header names or values are skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::debug!(name, "skipping invalid request header"),
        }
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Lenient decode: an empty or non-JSON body becomes `None`.
    pub fn json_bytes(mut self, bytes: &[u8]) -> Self {
        self.body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(bytes)
                .map_err(|e| tracing::debug!(error = %e, "request body is not JSON"))
                .ok()
        };
        self
    }
}

/// Per-request view handed to handlers. Built fresh by every dispatch.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: String,
    raw_path: String,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Option<Value>,
    pub(crate) auth: Option<AuthContext>,
}

impl RequestContext {
    pub(crate) fn new(
        method: String,
        raw_path: String,
        path: String,
        query: Option<String>,
        headers: HeaderMap,
        body: Option<Value>,
    ) -> Self {
        Self {
            method,
            raw_path,
            path,
            query,
            headers,
            body,
            auth: None,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The URI exactly as received.
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// The path used for route lookup.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Set only on protected routes, after the token was accepted.
    pub fn auth(&self) -> Option<&AuthContext> {
        self.auth.as_ref()
    }
}

/// Output sink shared by the dispatcher and handlers.
///
/// `status` stays `None` unless something sets it; the transport picks the
/// default.
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Single-line diagnostic header; control characters become spaces.
    pub fn set_reason(&mut self, name: &'static str, reason: &str) {
        let line: String = reason
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();

        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&line),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::debug!(name, "dropping diagnostic header"),
        }
    }

    pub fn write(&mut self, bytes: impl AsRef<[u8]>) {
        self.body.extend_from_slice(bytes.as_ref());
    }

    /// Replaces the body with `value` and sets a JSON content type.
    pub fn json(&mut self, value: &Value) {
        self.body = value.to_string().into_bytes();
        self.headers.insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_parts(self) -> (Option<StatusCode>, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}
