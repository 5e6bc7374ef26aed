// Error types for the bitflix gateway and client
// Author: kelexine (https://github.com/kelexine)

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid JSON in request body: {0}")]
    InvalidJson(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request payload too large")]
    PayloadTooLarge,

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Upstream request timed out")]
    UpstreamTimeout,

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("GraphQL proxy request failed: {0}")]
    GraphqlProxy(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Re-labels a generic forwarding failure as a GraphQL one so the
    /// response carries the `details` field.
    pub fn into_graphql(self) -> Self {
        match self {
            ProxyError::Upstream(msg) => ProxyError::GraphqlProxy(msg),
            ProxyError::Http(e) => ProxyError::GraphqlProxy(e.to_string()),
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::GraphQl(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convert ProxyError to HTTP responses for Axum
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ProxyError::Config(_) | ProxyError::ConfigParsing(_) => {
                json!({ "error": "Server configuration error" })
            }
            ProxyError::InvalidJson(_) => json!({ "error": "Invalid JSON in request body" }),
            ProxyError::NotFound(_) => json!({ "error": "Not found" }),
            ProxyError::PayloadTooLarge => json!({ "error": "Request payload too large" }),
            ProxyError::RateLimited { retry_after_secs } => json!({
                "error": "Too many requests from this IP, please try again later.",
                "retryAfter": retry_after_secs,
            }),
            ProxyError::UpstreamTimeout => json!({ "error": "Request timeout" }),
            ProxyError::Upstream(_) => json!({ "error": "Proxy request failed" }),
            ProxyError::GraphqlProxy(details) => json!({
                "error": "GraphQL proxy request failed",
                "details": details,
            }),
            ProxyError::GraphQl(message) => json!({ "error": message }),
            _ => json!({ "error": "Internal server error" }),
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let ProxyError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
