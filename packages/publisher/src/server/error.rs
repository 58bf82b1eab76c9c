//! Maps pipeline errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::common::{AuthError, PipelineError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("invalid cron secret")]
    CronUnauthorized,

    #[error("too many requests")]
    RateLimited,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(err) => match err {
                PipelineError::InvalidInput(_) | PipelineError::Slug(_) => StatusCode::BAD_REQUEST,
                PipelineError::Unauthorized(AuthError::AdminRequired) => StatusCode::FORBIDDEN,
                PipelineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
                PipelineError::InvalidState { .. } | PipelineError::AlreadyClaimed(_) => {
                    StatusCode::CONFLICT
                }
                PipelineError::Generation(_) => StatusCode::BAD_GATEWAY,
                PipelineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::CronUnauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
