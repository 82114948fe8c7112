mod auth;
mod errors;
mod routes_analytics;
mod routes_health;
mod routes_index;
mod routes_search;

use crate::config::Config;
use crate::service::SearchService;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub service: SearchService,
    pub config: Config,
}

pub fn router(service: SearchService) -> Router {
    let config = service.config().clone();
    let state = AppState { service, config };
    let cors = match &state.config.cors_allowed_origins {
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(Any),
        Some(list) => {
            let origins: Vec<axum::http::HeaderValue> = list
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_headers(Any)
                .allow_methods(Any)
        }
    };

    let admin = Router::<AppState>::new()
        .route("/index/products", post(routes_index::index_products))
        .route("/index/settings", post(routes_index::update_settings))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::admin_auth_middleware,
        ));

    Router::<AppState>::new()
        .route("/health", get(routes_health::health))
        .route("/metrics", get(routes_health::metrics))
        .route("/search", get(routes_search::search))
        .route("/search/facets", get(routes_search::facets))
        .route("/search/suggestions", get(routes_search::suggestions))
        .route("/search/similar/:product_id", get(routes_search::similar))
        .route("/search/filters/:kind", get(routes_search::filter_values))
        .route("/analytics/stats", get(routes_analytics::stats))
        .merge(admin)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(state.config.request_timeout_secs),
                )),
        )
        .with_state(state)
}
