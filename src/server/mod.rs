//! Axum-based admin API for gateledger.
//!
//! The request pipeline talks to the stores in-process; this server only
//! exposes the reporting side: usage snapshots, import, signature cache
//! stats and resets, health and Prometheus metrics.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual endpoints.
//! - `middleware`: Request ID tracking.
//! - `routes`: The router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use routes::{create_router, AppState};
