use super::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

/// Health check endpoint
/// Returns 200 OK while the process is running
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "log-service",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Readiness check endpoint
/// Returns 200 OK once both stores answer, 503 otherwise
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let severities = state.storage.severities.ping().await;
    let logs = state.storage.logs.ping().await;

    match severities.and(logs) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "service": "log-service",
                "ingestion": state.ingestion.is_some(),
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "service": "log-service",
                    "error": e.to_string(),
                })),
            )
        }
    }
}
