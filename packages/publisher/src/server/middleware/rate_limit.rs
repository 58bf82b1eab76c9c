// Rate limiting middleware over BaseRateLimitStore
//
// Fixed one-minute window per client IP, applied to the admin API only.
// The limit comes from ADMIN_RATE_LIMIT_PER_MINUTE.

use std::time::Duration;

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::ClientIp;
use crate::server::app::AppState;
use crate::server::error::ApiError;

const WINDOW: Duration = Duration::from_secs(60);

pub async fn admin_rate_limit(
    Extension(state): Extension<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = match request.extensions().get::<ClientIp>() {
        Some(ClientIp(ip)) => format!("admin:{}", ip),
        None => "admin:unknown".to_string(),
    };

    match state.deps.rate_limits.increment(&key, WINDOW).await {
        Ok(count) if count > state.admin_rate_limit_per_minute => {
            warn!(key = %key, count, "Admin rate limit exceeded");
            ApiError::RateLimited.into_response()
        }
        Ok(_) => next.run(request).await,
        Err(e) => {
            // Counter store down: let the request through
            warn!(error = %e, "Rate limit store unavailable");
            next.run(request).await
        }
    }
}
