// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client wrapper for the Second Innings backend.
//!
//! Every call resolves to an [`ApiResponse`]: a 2xx response becomes
//! `Success` carrying the decoded body unchanged, anything else becomes
//! `Failure` with a readable message. Nothing here returns `Err` or
//! panics on a bad response, so callers match on the result.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::identity::IdentityProvider;
use crate::storage::{keys, KeyValueStore};

/// Failure side of an [`ApiResponse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("No internet connection")]
    NoConnection,

    #[error("Request timeout")]
    Timeout,

    #[error("Network error occurred")]
    Network,

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),

    /// 2xx response whose body lacks what the caller needs
    #[error("Invalid response format")]
    InvalidResponse { status: u16, detail: String },
}

impl ApiError {
    /// HTTP status, or 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Http { status, .. } | ApiError::InvalidResponse { status, .. } => *status,
            _ => 0,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), 401 | 403)
    }
}

/// Result of a backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Success {
        status: u16,
        /// Decoded body; `Null` for an empty body
        data: Value,
        /// Envelope `message`, if any
        message: Option<String>,
    },
    Failure(ApiError),
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiResponse::Success { status, .. } => *status,
            ApiResponse::Failure(err) => err.status(),
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ApiResponse::Success { .. } => None,
            ApiResponse::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<Value, ApiError> {
        match self {
            ApiResponse::Success { data, .. } => Ok(data),
            ApiResponse::Failure(err) => Err(err),
        }
    }

    /// Decode `data.<key>` of the `{data, message}` envelope.
    pub fn extract<T: DeserializeOwned>(&self, key: &str) -> Result<T, ApiError> {
        match self {
            ApiResponse::Success { status, data, .. } => {
                let value = data
                    .get("data")
                    .and_then(|d| d.get(key))
                    .ok_or_else(|| ApiError::InvalidResponse {
                        status: *status,
                        detail: format!("missing data.{key}"),
                    })?;
                T::deserialize(value).map_err(|e| ApiError::InvalidResponse {
                    status: *status,
                    detail: format!("data.{key}: {e}"),
                })
            }
            ApiResponse::Failure(err) => Err(err.clone()),
        }
    }
}

/// Headers, query parameters and body of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
    query: Vec<(String, Option<String>)>,
    body: Option<Value>,
    body_error: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header; overrides the default JSON headers and bearer token.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter; `None` values are left off the URL.
    pub fn query<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.query.push((key.into(), value.map(|v| v.to_string())));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => self.body = Some(body),
            Err(e) => self.body_error = Some(e.to_string()),
        }
        self
    }

    fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.query
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
            .collect()
    }
}

/// Supplies the bearer token attached to each request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// Test token from durable storage if present, else a fresh identity token.
pub struct SessionTokens {
    storage: KeyValueStore,
    identity: Arc<dyn IdentityProvider>,
}

impl SessionTokens {
    pub fn new(storage: KeyValueStore, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { storage, identity }
    }
}

#[async_trait]
impl TokenSource for SessionTokens {
    async fn bearer_token(&self) -> Option<String> {
        if let Some(token) = self.storage.get(keys::TEST_TOKEN) {
            return Some(token);
        }
        self.identity.current_id_token().await
    }
}

/// Backend API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(config: &Config, tokens: Arc<dyn TokenSource>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.endpoint_url(""),
            tokens,
        })
    }

    /// Bearer token the next request would carry.
    pub async fn current_token(&self) -> Option<String> {
        self.tokens.bearer_token().await
    }

    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> ApiResponse {
        self.request(Method::GET, endpoint, options).await
    }

    pub async fn post(&self, endpoint: &str, options: RequestOptions) -> ApiResponse {
        self.request(Method::POST, endpoint, options).await
    }

    pub async fn put(&self, endpoint: &str, options: RequestOptions) -> ApiResponse {
        self.request(Method::PUT, endpoint, options).await
    }

    pub async fn delete(&self, endpoint: &str, options: RequestOptions) -> ApiResponse {
        self.request(Method::DELETE, endpoint, options).await
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResponse {
        if let Some(err) = &options.body_error {
            return ApiResponse::Failure(ApiError::Unexpected(err.clone()));
        }

        let headers = match self.build_headers(endpoint, &options).await {
            Ok(headers) => headers,
            Err(err) => return ApiResponse::Failure(err),
        };

        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.http.request(method.clone(), &url).headers(headers);

        let query = options.query_pairs();
        if !query.is_empty() {
            request = request.query(&query);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        tracing::debug!(method = %method, url = %url, "Sending API request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = classify_transport(&e);
                tracing::warn!(method = %method, endpoint, error = %e, "API request failed: {}", err);
                return ApiResponse::Failure(err);
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(method = %method, endpoint, status, error = %e, "Failed to read API response");
                return ApiResponse::Failure(classify_transport(&e));
            }
        };

        let result = interpret(status, &text);
        if let ApiResponse::Failure(err) = &result {
            tracing::warn!(method = %method, endpoint, status, error = %err, "API error response");
        }
        result
    }

    async fn build_headers(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        match self.tokens.bearer_token().await {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| ApiError::Unexpected("invalid bearer token".to_string()))?;
                headers.insert(AUTHORIZATION, value);
            }
            None => tracing::warn!(endpoint, "No bearer token available for request"),
        }

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Unexpected(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::Unexpected(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

fn classify_transport(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_connect() {
        ApiError::NoConnection
    } else if err.is_builder() {
        ApiError::Unexpected(err.to_string())
    } else {
        ApiError::Network
    }
}

/// Turn a status code and raw body into an [`ApiResponse`].
pub fn interpret(status: u16, body: &str) -> ApiResponse {
    let data = decode_body(body);

    if (200..300).contains(&status) {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        return ApiResponse::Success {
            status,
            data,
            message,
        };
    }

    ApiResponse::Failure(ApiError::Http {
        status,
        message: error_message(status, &data),
    })
}

fn decode_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Default message for a non-2xx status.
pub fn default_message(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown error occurred",
    }
}

fn error_message(status: u16, body: &Value) -> String {
    let base = ["error", "message"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .filter(|msg| !msg.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_message(status).to_string());

    if status == 422 {
        if let Some(fields) = field_errors(body) {
            return format!("{base}: {fields}");
        }
    }
    base
}

/// Render a `[{loc, msg}]` list as `"loc msg; loc msg"`.
fn field_errors(body: &Value) -> Option<String> {
    let items = ["detail", "data"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_array))?;

    let parts: Vec<String> = items
        .iter()
        .filter_map(|item| {
            let msg = item.get("msg").and_then(Value::as_str)?;
            let loc = item
                .get("loc")
                .and_then(Value::as_array)
                .map(|loc| render_loc(loc))
                .unwrap_or_default();
            Some(if loc.is_empty() {
                msg.to_string()
            } else {
                format!("{loc} {msg}")
            })
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join("; "))
}

fn render_loc(loc: &[Value]) -> String {
    let mut segments: Vec<String> = loc
        .iter()
        .map(|segment| match segment {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    // The request part ("body", "query", "path") is noise once a field name follows.
    if segments.len() > 1 && matches!(segments[0].as_str(), "body" | "query" | "path") {
        segments.remove(0);
    }
    segments.join(".")
}

/// Percent-encode an id for use as a path segment.
pub fn segment(id: impl ToString) -> String {
    urlencoding::encode(&id.to_string()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_keeps_body_unchanged() {
        let body = json!({ "message": "ok", "data": { "tickets": [] } });
        let response = interpret(200, &body.to_string());
        assert_eq!(
            response,
            ApiResponse::Success {
                status: 200,
                data: body,
                message: Some("ok".to_string()),
            }
        );
    }

    #[test]
    fn empty_body_is_null() {
        assert_eq!(
            interpret(204, ""),
            ApiResponse::Success {
                status: 204,
                data: Value::Null,
                message: None,
            }
        );
    }

    #[test]
    fn body_message_overrides_default() {
        let response = interpret(404, r#"{"message": "Ticket not found."}"#);
        assert_eq!(response.error().unwrap().message(), "Ticket not found.");

        let response = interpret(400, r#"{"error": "bad id", "message": "ignored"}"#);
        assert_eq!(response.error().unwrap().message(), "bad id");
    }

    #[test]
    fn unknown_status_message() {
        let response = interpret(418, "teapot");
        assert_eq!(
            response.error().unwrap().message(),
            "Unknown error occurred"
        );
        assert_eq!(response.status(), 418);
    }

    #[test]
    fn validation_errors_list_fields() {
        let body = json!({
            "detail": [
                { "loc": ["body", "priority"], "msg": "invalid" },
                { "loc": ["body", "assignee", 0], "msg": "not found" }
            ]
        });
        let response = interpret(422, &body.to_string());
        assert_eq!(
            response.error().unwrap().message(),
            "Unprocessable Entity: priority invalid; assignee.0 not found"
        );
    }

    #[test]
    fn extract_reads_envelope_data() {
        let response = interpret(200, r#"{"data": {"ticket_id": 12}}"#);
        assert_eq!(response.extract::<i64>("ticket_id").unwrap(), 12);

        let err = response.extract::<i64>("group_id").unwrap_err();
        assert_eq!(err.message(), "Invalid response format");
        assert_eq!(err.status(), 200);
    }

    #[test]
    fn segment_encodes_ids() {
        assert_eq!(segment(42), "42");
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }
}
