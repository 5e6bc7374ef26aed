// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{ProxyError, Result};
use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use std::path::{Path, PathBuf};

/// Environment names used by earlier deployments, mapped onto config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("MOVIES_API_URL", "upstream.base_url"),
    ("MOVIES_API_KEY", "upstream.api_key"),
    ("PORT", "server.port"),
    ("FETCH_TIMEOUT_MS", "upstream.timeout_ms"),
    ("RATE_LIMIT_WINDOW_MS", "rate_limit.window_ms"),
    ("RATE_LIMIT_MAX_REQUESTS", "rate_limit.max_requests"),
    ("MAX_REQUEST_SIZE", "limits.max_request_size"),
    ("CACHE_TTL_SECONDS", "client.cache_ttl_seconds"),
    ("ITEMS_PER_PAGE", "client.items_per_page"),
    ("GRAPHQL_URL", "client.graphql_url"),
];

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Legacy environment names (highest)
    /// 2. `BITFLIX_` environment variables
    /// 3. Config file
    /// 4. Defaults (lowest)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let vars: config::Map<String, String> = std::env::vars().collect();
        Self::load_with_env(config_path, vars)
    }

    /// Same as [`AppConfig::load`] but reads variables from `vars` instead of
    /// the process environment.
    pub fn load_with_env(
        config_path: Option<&Path>,
        vars: config::Map<String, String>,
    ) -> Result<Self> {
        let file = match config_path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::from(Self::default_config_path()).required(false),
        };

        let mut builder: ConfigBuilder<DefaultState> = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            // BITFLIX_UPSTREAM__TIMEOUT_MS -> upstream.timeout_ms
            .add_source(
                Environment::with_prefix("BITFLIX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        for (name, key) in LEGACY_ENV {
            let value = vars.get(*name).filter(|v| !v.is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        let config = builder
            .build()
            .map_err(|e| ProxyError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ProxyError::Config(e.to_string()))
    }

    /// Checks that the gateway can forward traffic.
    ///
    /// A missing upstream URL or credential is reported here so the caller
    /// can start the gateway fail-closed instead of forwarding with empty
    /// values.
    pub fn validate(&self) -> Result<()> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(ProxyError::Config("upstream base URL is not set".to_string()));
        }
        if self.upstream.api_key.trim().is_empty() {
            return Err(ProxyError::Config("upstream credential is not set".to_string()));
        }
        reqwest::Url::parse(&self.upstream.base_url).map_err(|e| {
            ProxyError::Config(format!(
                "invalid upstream base URL {:?}: {}",
                self.upstream.base_url, e
            ))
        })?;
        Ok(())
    }

    /// Checks the numeric limits. Unlike [`AppConfig::validate`], a failure
    /// here is fatal at startup.
    pub fn validate_limits(&self) -> Result<()> {
        if self.upstream.timeout_ms == 0 {
            return Err(ProxyError::Config("upstream.timeout_ms must be positive".to_string()));
        }
        if self.rate_limit.window_ms == 0 || self.rate_limit.max_requests == 0 {
            return Err(ProxyError::Config(
                "rate_limit.window_ms and rate_limit.max_requests must be positive".to_string(),
            ));
        }
        if self.client.items_per_page == 0 {
            return Err(ProxyError::Config("client.items_per_page must be positive".to_string()));
        }
        if self.client.sweep_interval_seconds == 0 {
            return Err(ProxyError::Config(
                "client.sweep_interval_seconds must be positive".to_string(),
            ));
        }
        self.max_body_bytes()?;
        Ok(())
    }

    /// Inbound body limit in bytes.
    pub fn max_body_bytes(&self) -> Result<usize> {
        parse_size(&self.limits.max_request_size)
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bitflix")
            .join("config.toml")
    }
}

/// Parses a human size string such as `1mb`, `512kb` or `2048` into bytes.
/// Units are 1024-based and case-insensitive.
pub fn parse_size(input: &str) -> Result<usize> {
    let normalized = input.trim().to_ascii_lowercase();
    let split = normalized
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(normalized.len());
    let (number, unit) = normalized.split_at(split);

    let multiplier: f64 = match unit.trim() {
        "" | "b" => 1.0,
        "kb" | "k" => 1024.0,
        "mb" | "m" => 1024.0 * 1024.0,
        "gb" | "g" => 1024.0 * 1024.0 * 1024.0,
        other => {
            return Err(ProxyError::Config(format!("unknown size unit {:?} in {:?}", other, input)))
        }
    };

    let value: f64 = number
        .parse()
        .map_err(|_| ProxyError::Config(format!("invalid size {:?}", input)))?;

    Ok((value * multiplier) as usize)
}
