//! Structured logging and key-masking utilities.
//!
//! This module configures the `tracing` ecosystem for the application,
//! supporting multiple output formats and providing helpers that keep client
//! API keys and bearer tokens out of log sinks.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::{GatewayError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static SANITIZE_KEYS: AtomicBool = AtomicBool::new(true);

/// Initializes the global tracing subscriber for the application.
///
/// Supports three output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: Single-line human-readable output.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    SANITIZE_KEYS.store(config.sanitize_keys, Ordering::Relaxed);

    // Configure filter from environment or config file
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "compact" => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    result.map_err(|e| GatewayError::Internal(format!("failed to initialize logging: {}", e)))
}

/// Shortens a secret to a recognizable prefix for log lines.
///
/// Returns the input unchanged when key sanitization is switched off.
pub fn mask_secret(secret: &str) -> String {
    if !SANITIZE_KEYS.load(Ordering::Relaxed) {
        return secret.to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    if prefix.len() == secret.len() {
        return "****".to_string();
    }
    format!("{}****", prefix)
}

/// Redacts API keys and bearer tokens from free-form log text.
///
/// Recognizes `sk-...` style keys and the token following `Bearer `.
pub fn sanitize(input: &str) -> String {
    let mut result = input.to_string();

    for (marker, replacement) in [("Bearer ", "Bearer [REDACTED_TOKEN]"), ("sk-", "[REDACTED_KEY]")] {
        let mut search_from = 0;
        while let Some(offset) = result[search_from..].find(marker) {
            let start = search_from + offset;
            let end = result[start + marker.len()..]
                .find(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == ',')
                .map(|i| start + marker.len() + i)
                .unwrap_or(result.len());
            if end == start + marker.len() {
                search_from = end;
                continue;
            }
            result.replace_range(start..end, replacement);
            search_from = start + replacement.len();
        }
    }

    result
}
