use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use forum_shared::{HealthCheck, HealthResponse, HealthStatus};
use std::sync::Arc;

use crate::AppState;

/// Health check that probes the backing store.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let storage = match state.store.ping() {
        Ok(()) => HealthCheck::passed("storage"),
        Err(e) => {
            tracing::error!(error = %e, "storage health check failed");
            HealthCheck::failed("storage", "storage unavailable")
        }
    };

    let response = HealthResponse::healthy("forum-moderation", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![storage]);

    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (status, Json(response)).into_response()
}

/// Prometheus exposition; empty when no recorder is installed.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
