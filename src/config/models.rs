//! Configuration data structures for gateledger.
//!
//! This module defines the schema for the application settings: the admin
//! server, logging, the thinking-signature cache and the usage statistics
//! store.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::signature::SignatureCacheConfig;
use crate::usage::UsageConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Admin HTTP server settings (host, port, workers).
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Thinking-signature cache settings.
    #[serde(default)]
    pub signature_cache: SignatureCacheSettings,

    /// Usage statistics settings.
    #[serde(default)]
    pub usage: UsageSettings,
}

/// Settings for the built-in admin HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8317`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of tokio worker threads.
    /// Default: Number of logical CPU cores.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask API keys in logs.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_keys: bool,
}

/// Tunables for the thinking-signature cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureCacheSettings {
    /// Lifetime of a cached signature, in seconds.
    /// Default: `3600`
    #[serde(default = "default_signature_ttl")]
    pub ttl_seconds: u64,

    /// Per model group capacity before the oldest entry is evicted.
    /// Default: `1000`
    #[serde(default = "default_max_entries_per_group")]
    pub max_entries_per_group: usize,

    /// Interval of the background expiry sweep, in seconds. `0` disables it.
    /// Default: `600`
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// Signatures shorter than this are rejected.
    /// Default: `50`
    #[serde(default = "default_min_signature_len")]
    pub min_signature_len: usize,
}

/// Tunables for the usage statistics store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSettings {
    /// Whether completed requests are recorded at all.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cap of the recent-activity window kept per (api key, model).
    /// Default: `1000`
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

impl SignatureCacheSettings {
    pub fn to_cache_config(&self) -> SignatureCacheConfig {
        SignatureCacheConfig {
            ttl: Duration::from_secs(self.ttl_seconds),
            max_entries_per_group: self.max_entries_per_group,
            min_signature_len: self.min_signature_len,
        }
    }

    /// `None` when the background sweep is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_seconds > 0).then(|| Duration::from_secs(self.sweep_interval_seconds))
    }
}

impl UsageSettings {
    pub fn to_usage_config(&self) -> UsageConfig {
        UsageConfig {
            enabled: self.enabled,
            recent_window: self.recent_window,
        }
    }
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_keys: true,
        }
    }
}

impl Default for SignatureCacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_signature_ttl(),
            max_entries_per_group: default_max_entries_per_group(),
            sweep_interval_seconds: default_sweep_interval(),
            min_signature_len: default_min_signature_len(),
        }
    }
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_window: default_recent_window(),
        }
    }
}

// Helper functions for serde defaults
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8317
}

fn default_workers() -> usize {
    num_cpus::get()
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

fn default_signature_ttl() -> u64 {
    crate::signature::DEFAULT_SIGNATURE_TTL.as_secs()
}

fn default_max_entries_per_group() -> usize {
    crate::signature::DEFAULT_MAX_ENTRIES_PER_GROUP
}

fn default_sweep_interval() -> u64 {
    600 // 10 minutes
}

fn default_min_signature_len() -> usize {
    crate::signature::MIN_SIGNATURE_LEN
}

fn default_recent_window() -> usize {
    crate::usage::DEFAULT_RECENT_WINDOW
}
