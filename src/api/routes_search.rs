use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::service::types::{FilterKind, FilterValuesResponse, SearchParams};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

/// Turns a query-string rejection into the JSON error shape.
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(params)| params).map_err(|rejection| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_argument",
            rejection.body_text(),
        )
    })
}

pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(query)?;
    let response = state.service.search(params).await?;
    Ok(axum::Json(response))
}

pub async fn facets(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(query)?;
    let response = state.service.faceted_search(params).await?;
    Ok(axum::Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

pub async fn suggestions(
    State(state): State<AppState>,
    query: Result<Query<SuggestionsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(query)?;
    let response = state.service.suggestions(params.q, params.limit).await?;
    Ok(axum::Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<usize>,
}

pub async fn similar(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    query: Result<Query<SimilarQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(query)?;
    let response = state.service.similar(&product_id, params.limit).await?;
    Ok(axum::Json(response))
}

pub async fn filter_values(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(kind) = FilterKind::from_path(&kind) else {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("unknown filter {kind}, expected groups, record-types or ply-ratings"),
        ));
    };
    let values = state.service.filter_values(kind).await?;
    Ok(axum::Json(FilterValuesResponse::new(kind, values)))
}
