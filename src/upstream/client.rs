// Upstream movie API client with credential injection and deadlines
// Author: kelexine (https://github.com/kelexine)

use super::{ROUTE_GRAPHQL, ROUTE_HEALTHCHECK};
use crate::config::UpstreamConfig;
use crate::error::{ProxyError, Result};
use crate::metrics;
use crate::utils::logging::redact;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Client for the upstream movie API.
///
/// Every call carries `Authorization: Bearer <credential>` and races a
/// deadline armed when the call starts. When the deadline wins, the
/// in-flight request future is dropped, which aborts the connection, and
/// the caller gets [`ProxyError::UpstreamTimeout`].
pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    sanitize_logs: bool,
}

/// Upstream status and decoded JSON body, passed through unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self.body)).into_response()
    }
}

impl UpstreamClient {
    /// Create a new upstream client.
    ///
    /// Fails with [`ProxyError::Config`] when the base URL or credential is
    /// missing, so a misconfigured gateway never forwards with empty values.
    pub fn new(config: &UpstreamConfig, sanitize_logs: bool) -> Result<Self> {
        if config.base_url.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(ProxyError::Config(
                "upstream base URL and credential are required".to_string(),
            ));
        }

        // No client-wide timeout: the per-call deadline decides
        let http_client = Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created upstream HTTP client with connection pooling");

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
            sanitize_logs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forwards a GET to `{base}{path_and_query}`.
    ///
    /// `path_and_query` is the inbound path plus query string, verbatim.
    pub async fn forward_get(&self, path_and_query: &str) -> Result<UpstreamReply> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!("Proxying healthcheck request to: {}", url);

        let request = self.authorized(self.http_client.get(&url));
        self.execute(ROUTE_HEALTHCHECK, request).await
    }

    /// Forwards a GraphQL document to `{base}/graphql`.
    pub async fn forward_graphql(&self, body: &Value) -> Result<UpstreamReply> {
        let url = format!("{}/graphql", self.base_url);
        debug!("Proxying GraphQL request to: {}", url);

        let request = self.authorized(self.http_client.post(&url)).json(body);
        self.execute(ROUTE_GRAPHQL, request).await
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    async fn execute(&self, route: &str, request: RequestBuilder) -> Result<UpstreamReply> {
        let start = Instant::now();

        let result = with_deadline(self.timeout, async move {
            let response = request
                .send()
                .await
                .map_err(|e| ProxyError::Upstream(e.to_string()))?;

            let status = StatusCode::from_u16(response.status().as_u16())
                .map_err(|e| ProxyError::Upstream(e.to_string()))?;
            let body = response
                .json::<Value>()
                .await
                .map_err(|e| ProxyError::Upstream(format!("invalid upstream body: {}", e)))?;

            Ok(UpstreamReply { status, body })
        })
        .await;

        metrics::record_upstream_call(route, start.elapsed().as_secs_f64());

        match &result {
            Ok(reply) => debug!("{} upstream answered {}", route, reply.status),
            Err(ProxyError::UpstreamTimeout) => {
                metrics::record_upstream_timeout(route);
                error!("{} timeout after {:?}: {}", route, self.timeout, self.base_url);
            }
            Err(e) => error!("{} proxy error: {}", route, self.scrub(&e.to_string())),
        }
        result
    }

    fn scrub(&self, message: &str) -> String {
        if self.sanitize_logs {
            redact(message, &self.api_key)
        } else {
            message.to_string()
        }
    }
}

/// Runs `call` against a deadline.
///
/// The timer is dropped as soon as `call` completes, and `call` is dropped
/// (cancelled) as soon as the timer fires, so a late result can never be
/// observed.
pub async fn with_deadline<F, T>(deadline: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ProxyError::UpstreamTimeout),
    }
}
