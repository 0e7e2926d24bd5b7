/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "checkedAt": "2026-01-01T00:00:00Z",
///   "gate": { "allowed": 10, "denied": 2, "rejected": 1, "reverseLookupFailures": 0 }
/// }
/// ```
///
/// `gate.reverseLookupFailures` counts storage errors swallowed while
/// resolving a shelter from a record id; a rising value means the store is
/// failing even though requests still get answered.

use crate::app::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelterhub_shared::auth::metrics::GateMetricsSnapshot;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    pub version: String,
    /// "connected" or "disconnected"
    pub database: String,
    pub checked_at: DateTime<Utc>,
    pub gate: GateMetricsSnapshot,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the store");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        checked_at: Utc::now(),
        gate: state.metrics.snapshot(),
    })
}
