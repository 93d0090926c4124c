// gateledger - Usage telemetry and thinking-signature cache for AI gateways
// Author: kelexine (https://github.com/kelexine)

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod server;
pub mod signature;
pub mod usage;
pub mod utils;
