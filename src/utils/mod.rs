//! Utility functions and helpers for gateledger.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and API key masking.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
