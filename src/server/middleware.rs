// HTTP middleware
// Author: kelexine (https://github.com/kelexine)

use super::rate_limit::Decision;
use super::routes::AppState;
use crate::error::ProxyError;
use crate::metrics;
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::warn;

/// Create request ID layers for the application
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}

/// Rejects clients over quota with 429 before the handler runs.
/// Preflight requests are never counted.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let client = client_identity(&request, state.config.server.trust_forwarded_for);

    match state.rate_limiter.check(&client) {
        Decision::Admitted(quota) => {
            let mut response = next.run(request).await;
            quota.apply(response.headers_mut());
            response
        }
        Decision::Rejected(quota) => {
            warn!("Rate limit exceeded for IP: {}", client);
            metrics::record_rate_limited();
            let mut response = ProxyError::RateLimited {
                retry_after_secs: quota.reset_after_secs(),
            }
            .into_response();
            quota.apply(response.headers_mut());
            response
        }
    }
}

/// Path prefixes owned by the gateway. The frontend fallback never
/// answers for them.
pub const API_PREFIXES: &[&str] = &[
    "/healthcheck",
    "/graphql",
    "/api/healthcheck",
    "/api/graphql",
    "/metrics",
];

/// Keeps the frontend fallback from serving `index.html` for API paths
/// such as `/graphql/schema`.
pub async fn reject_api_paths(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if API_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return ProxyError::NotFound(path.to_string()).into_response();
    }
    next.run(request).await
}

/// Counts responses per matched route and status.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "static".to_string());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16());
    response
}

/// Identifies the client for rate limiting: the first `X-Forwarded-For`
/// hop when trusted, otherwise the peer address.
pub fn client_identity(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
