use crate::api::errors::ApiError;
use crate::api::AppState;
use axum::extract::State;
use axum::response::IntoResponse;

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.service.stats().await?;
    Ok(axum::Json(stats))
}
