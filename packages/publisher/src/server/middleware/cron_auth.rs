use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Guard for the cron trigger routes: `Authorization: Bearer <CRON_SECRET>`.
/// With no secret configured every call is rejected.
pub async fn require_cron_secret(
    Extension(state): Extension<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.cron_secret.as_deref() else {
        warn!("Cron trigger called but CRON_SECRET is not configured");
        return ApiError::CronUnauthorized.into_response();
    };

    let provided = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    if provided.is_some_and(|p| secret_matches(expected, p)) {
        next.run(request).await
    } else {
        warn!("Cron trigger called with a missing or bad secret");
        ApiError::CronUnauthorized.into_response()
    }
}

/// Compare without leaking the matching prefix length through timing.
fn secret_matches(expected: &str, provided: &str) -> bool {
    bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
}
