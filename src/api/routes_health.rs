use crate::api::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

/// Readiness against the search engine: 200 when it answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let service = state.config.service_name.clone();
    match state.service.health().await {
        Ok((health, version)) => (
            StatusCode::OK,
            axum::Json(json!({
                "status": "healthy",
                "meilisearch": {
                    "status": health.status,
                    "version": version.pkg_version,
                },
                "service": service,
            })),
        ),
        Err(err) => {
            tracing::error!(%err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(json!({
                    "status": "unhealthy",
                    "error": err.to_string(),
                    "service": service,
                })),
            )
        }
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, state.service.metrics_text())
}
