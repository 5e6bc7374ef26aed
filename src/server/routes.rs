// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{graphql_handler, graphql_preflight, healthcheck_handler, metrics_handler};
use super::middleware::{rate_limit, reject_api_paths, request_id_layers, track_requests};
use super::rate_limit::RateLimiter;
use crate::config::AppConfig;
use crate::error::{ProxyError, Result};
use crate::upstream::UpstreamClient;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` when the upstream URL or credential is missing; every proxied
    /// route then answers with a configuration error.
    pub upstream: Option<Arc<UpstreamClient>>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate_limits()?;

        let upstream = match config
            .validate()
            .and_then(|_| UpstreamClient::new(&config.upstream, config.logging.sanitize_tokens))
        {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                error!("Upstream disabled, refusing proxied traffic: {}", e);
                None
            }
        };

        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit.window(),
            config.rate_limit.max_requests,
        )?);

        Ok(Self {
            config: Arc::new(config),
            upstream,
            rate_limiter,
        })
    }

    pub fn upstream(&self) -> Result<&UpstreamClient> {
        self.upstream
            .as_deref()
            .ok_or_else(|| ProxyError::Config("upstream is not configured".to_string()))
    }
}

pub fn create_router(state: AppState) -> Result<Router> {
    let max_body = state.config.max_body_bytes()?;
    let limited = from_fn_with_state(state.clone(), rate_limit);

    let healthcheck = Router::new()
        .route("/healthcheck", get(healthcheck_handler))
        .route("/api/healthcheck", get(healthcheck_handler))
        .route_layer(limited.clone());

    let graphql = Router::new()
        .route("/graphql", post(graphql_handler).options(graphql_preflight))
        .route("/api/graphql", post(graphql_handler).options(graphql_preflight))
        .route_layer(limited)
        // Every GraphQL response carries the origin header, 429s included
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ));

    let mut app = Router::new()
        .merge(healthcheck)
        .merge(graphql)
        .route("/metrics", get(metrics_handler));

    let static_dir = Path::new(&state.config.server.static_dir);
    if static_dir.is_dir() {
        info!("Serving frontend from {}", static_dir.display());
        let index = ServeFile::new(static_dir.join("index.html"));
        let frontend = Router::new()
            .fallback_service(ServeDir::new(static_dir).fallback(index))
            .layer(from_fn(reject_api_paths));
        app = app.merge(frontend);
    }

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = app
        .layer(DefaultBodyLimit::max(max_body))
        .layer(from_fn(track_requests))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
