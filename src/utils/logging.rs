//! Structured logging and credential-safe trace utilities.
//!
//! This module configures the `tracing` ecosystem for the application,
//! supporting multiple output formats and keeping the upstream bearer
//! credential out of log sinks.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::{ProxyError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the application.
///
/// Supports two output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = match config.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    installed.map_err(|e| ProxyError::Internal(format!("Failed to install logger: {}", e)))
}

/// Replaces every occurrence of `secret` in `input` with `[REDACTED]`.
///
/// Secrets shorter than four characters are left alone; masking them would
/// mangle ordinary text.
pub fn redact(input: &str, secret: &str) -> String {
    if secret.len() < 4 {
        return input.to_string();
    }
    input.replace(secret, "[REDACTED]")
}

/// Renders whether a setting is present without revealing its value.
pub fn presence(value: &str) -> &'static str {
    if value.trim().is_empty() {
        "Not set"
    } else {
        "Set"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_credential() {
        let output = redact("Authorization: Bearer abc123-secret", "abc123-secret");
        assert_eq!(output, "Authorization: Bearer [REDACTED]");
    }

    #[test]
    fn test_redact_short_secret_untouched() {
        assert_eq!(redact("a b c", "a"), "a b c");
    }

    #[test]
    fn test_presence() {
        assert_eq!(presence(""), "Not set");
        assert_eq!(presence("https://movies.example.com"), "Set");
    }
}
