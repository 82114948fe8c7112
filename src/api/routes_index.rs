use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::service::catalog::{IndexSettings, Product};
use axum::extract::State;
use axum::response::IntoResponse;

pub async fn index_products(
    State(state): State<AppState>,
    axum::Json(products): axum::Json<Vec<Product>>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.service.index_products(products).await?;
    Ok(axum::Json(task))
}

pub async fn update_settings(
    State(state): State<AppState>,
    axum::Json(settings): axum::Json<IndexSettings>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.service.update_settings(settings).await?;
    Ok(axum::Json(task))
}
