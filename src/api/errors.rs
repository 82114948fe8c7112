use crate::meili::MeiliError;
use crate::service::ServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(msg) => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_argument", msg)
            }
            ServiceError::NotFound(msg) => ApiError::new(StatusCode::NOT_FOUND, "not_found", msg),
            ServiceError::Upstream(MeiliError::Api {
                status,
                code,
                message,
            }) => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                format!("search engine rejected the request ({status} {code}): {message}"),
            ),
            ServiceError::Upstream(MeiliError::Transport(err)) => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "upstream_unavailable",
                format!("search engine unavailable: {err}"),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = axum::Json(ErrorBody {
            error: self.code,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}
