// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{GatewayError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Precedence, highest first:
    /// 1. Environment variables (`GATELEDGER__SECTION__KEY`)
    /// 2. Config file (`~/.gateledger/config.toml`, optional)
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_config_path(), false)
    }

    /// Load configuration from an explicit file path.
    ///
    /// When `required` is set, a missing file is an error instead of being
    /// silently skipped. CLI overrides are applied by the caller afterwards.
    pub fn load_from(path: &Path, required: bool) -> Result<Self> {
        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path.to_path_buf()).required(required))
            .add_source(
                Environment::with_prefix("GATELEDGER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values that would make the stores unusable.
    pub fn validate(&self) -> Result<()> {
        if self.usage.recent_window == 0 {
            return Err(GatewayError::Config(
                "usage.recent_window must be at least 1".to_string(),
            ));
        }
        if self.signature_cache.ttl_seconds == 0 {
            return Err(GatewayError::Config(
                "signature_cache.ttl_seconds must be at least 1".to_string(),
            ));
        }
        if self.signature_cache.max_entries_per_group == 0 {
            return Err(GatewayError::Config(
                "signature_cache.max_entries_per_group must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gateledger")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_window_rejected() {
        let mut config = AppConfig::default();
        config.usage.recent_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
