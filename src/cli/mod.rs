// CLI module for gateledger
// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// gateledger - usage telemetry and thinking-signature cache for AI gateways
#[derive(Parser, Debug)]
#[command(name = "gateledger", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.gateledger/config.toml)
    #[arg(short, long, env = "GATELEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the admin server bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Override the admin server port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_applied() {
        let args = Args::parse_from(["gateledger", "--port", "9000"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }
}
