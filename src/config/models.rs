//! Configuration data structures for the bitflix gateway.
//!
//! This module defines the schema for the application settings: the HTTP
//! listener, the upstream movie API, rate limiting, request limits, the
//! data-fetch client and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, static assets).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream movie API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Per-client request quota.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Inbound request limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Data-fetch client and query cache settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `0.0.0.0`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `3000`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the built frontend. Skipped when it does not exist.
    /// Default: `build`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Use the first `X-Forwarded-For` entry as the client identity.
    /// Default: `false`
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

/// Settings for the upstream movie API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the movie API. Required.
    #[serde(default)]
    pub base_url: String,

    /// Bearer credential injected into every forwarded call. Required.
    #[serde(default)]
    pub api_key: String,

    /// Deadline for a single forwarded call in milliseconds.
    /// Default: `10000`
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Settings for the per-client fixed window limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds.
    /// Default: `60000`
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Requests admitted per client per window.
    /// Default: `100`
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

/// Settings for inbound request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum request body size (`512kb`, `1mb`, `2048`...).
    /// Default: `1mb`
    #[serde(default = "default_max_request_size")]
    pub max_request_size: String,
}

/// Settings for the data-fetch client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// GraphQL endpoint the client talks to (normally this gateway).
    /// Default: `http://localhost:3000/graphql`
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// Age after which cached query results are swept.
    /// Default: `60`
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// How often the cache sweep runs.
    /// Default: `5`
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// Movies per page.
    /// Default: `12`
    #[serde(default = "default_items_per_page")]
    pub items_per_page: u32,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask the upstream credential in logs.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_tokens: bool,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl ClientConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            trust_forwarded_for: false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: default_max_request_size(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            graphql_url: default_graphql_url(),
            cache_ttl_seconds: default_cache_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            items_per_page: default_items_per_page(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_tokens: true,
        }
    }
}

// Helper functions for serde defaults
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "build".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_max_requests() -> u32 {
    100
}

fn default_max_request_size() -> String {
    "1mb".to_string()
}

fn default_graphql_url() -> String {
    "http://localhost:3000/graphql".to_string()
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    5
}

fn default_items_per_page() -> u32 {
    12
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
