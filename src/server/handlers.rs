// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::{ProxyError, Result};
use crate::metrics::gather_metrics;
use crate::upstream::UpstreamReply;
use axum::extract::rejection::BytesRejection;
use axum::extract::{OriginalUri, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

/// Handler for `GET /healthcheck` and `GET /api/healthcheck`.
///
/// Forwards path and query string verbatim and mirrors the upstream
/// status and body.
pub async fn healthcheck_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<UpstreamReply> {
    let upstream = state.upstream()?;

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    upstream.forward_get(path_and_query).await
}

/// Handler for `POST /graphql` and `POST /api/graphql`.
///
/// The body is checked for size, then parsed, and only forwarded when it is
/// valid JSON.
pub async fn graphql_handler(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<UpstreamReply> {
    let upstream = state.upstream()?;

    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ProxyError::PayloadTooLarge
        } else {
            ProxyError::InvalidJson(rejection.body_text())
        }
    })?;

    let payload: Value = serde_json::from_slice(&bytes).map_err(|e| {
        debug!("Rejecting GraphQL body: {}", e);
        ProxyError::InvalidJson(e.to_string())
    })?;

    upstream
        .forward_graphql(&payload)
        .await
        .map_err(ProxyError::into_graphql)
}

/// Handler for `OPTIONS /graphql`. `Access-Control-Allow-Origin` is added
/// by the CORS layer shared with the POST route.
pub async fn graphql_preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
        ],
    )
}

/// Handler for `GET /metrics` in Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}
