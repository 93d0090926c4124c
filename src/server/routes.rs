// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    clear_signatures_handler, health_handler, import_usage_handler, metrics_handler,
    set_usage_enabled_handler, signature_stats_handler, usage_handler,
};
use super::middleware::{make_request_span, no_store_layer, request_id_layers};
use crate::config::AppConfig;
use crate::signature::SignatureCache;
use crate::usage::UsageStore;
use axum::{
    body::Body,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub signatures: Arc<SignatureCache>,
    pub usage: Arc<UsageStore>,
}

pub fn create_router(
    config: AppConfig,
    signatures: Arc<SignatureCache>,
    usage: Arc<UsageStore>,
) -> Router {
    crate::metrics::init();

    let state = AppState {
        config,
        signatures,
        usage,
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/v0/management/usage", get(usage_handler))
        .route("/v0/management/usage/import", post(import_usage_handler))
        .route("/v0/management/usage/enabled", put(set_usage_enabled_handler))
        .route(
            "/v0/management/signatures",
            get(signature_stats_handler).delete(clear_signatures_handler),
        )
        // Exported snapshots carry up to one window per (key, model)
        .layer(tower_http::limit::RequestBodyLimitLayer::new(64 * 1024 * 1024))
        .layer(no_store_layer())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
