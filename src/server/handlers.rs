// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::GatewayError;
use crate::metrics::{gather_metrics, update_signature_entries};
use crate::signature::SignatureCacheStats;
use crate::usage::{MergeResult, UsageSnapshot};
use crate::utils::logging::sanitize;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    let stats = state.signatures.stats();
    checks.insert(
        "signature_cache".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: format!(
                "{} entries in {} groups, ttl {}s",
                stats.entries, stats.groups, state.config.signature_cache.ttl_seconds
            ),
        },
    );

    let usage_check = if state.usage.is_enabled() {
        HealthCheck {
            status: "ok".to_string(),
            message: format!(
                "Recording, window of {} (configured {})",
                state.usage.recent_window(),
                state.config.usage.recent_window
            ),
        }
    } else {
        overall_status = HealthStatus::Degraded;
        HealthCheck {
            status: "warning".to_string(),
            message: "Usage statistics disabled".to_string(),
        }
    };
    checks.insert("usage_statistics".to_string(), usage_check);

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    update_signature_entries(state.signatures.len());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub usage: UsageSnapshot,
}

pub async fn usage_handler(State(state): State<AppState>) -> Json<UsageResponse> {
    Json(UsageResponse {
        usage: state.usage.snapshot(),
    })
}

/// Import an exported snapshot, bare or wrapped as `{"usage": ...}`.
pub async fn import_usage_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<MergeResult>, GatewayError> {
    let mut payload: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
        let excerpt: String = body.chars().take(200).collect();
        warn!("Rejected usage import: {} (body: {})", e, sanitize(&excerpt));
        GatewayError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })?;

    if payload.get("usage").is_some() {
        payload = payload["usage"].take();
    }

    let snapshot: UsageSnapshot = serde_json::from_value(payload)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid usage snapshot: {}", e)))?;

    let result = state.usage.merge_snapshot(&snapshot);
    info!(
        "Imported usage snapshot: {} added, {} skipped",
        result.added, result.skipped
    );
    Ok(Json(result))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnabledRequest {
    pub value: bool,
}

pub async fn set_usage_enabled_handler(
    State(state): State<AppState>,
    Json(req): Json<EnabledRequest>,
) -> Json<EnabledRequest> {
    state.usage.set_enabled(req.value);
    Json(EnabledRequest {
        value: state.usage.is_enabled(),
    })
}

pub async fn signature_stats_handler(State(state): State<AppState>) -> Json<SignatureCacheStats> {
    Json(state.signatures.stats())
}

#[derive(Debug, Deserialize)]
pub struct ClearQuery {
    pub group: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub cleared: String,
}

pub async fn clear_signatures_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Json<ClearResponse> {
    let group = query.group.unwrap_or_default();
    state.signatures.clear_signature_cache(&group);

    let cleared = if group.is_empty() { "all".to_string() } else { group };
    info!("Cleared thinking signatures: {}", cleared);
    Json(ClearResponse { cleared })
}
