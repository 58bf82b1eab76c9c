//! `GET /health`: queue store reachability and queue depth.

use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

use crate::domains::queue::models::StatusCounts;
use crate::server::app::AppState;

const STORE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    /// Per-status item counts; absent when the store could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<StatusCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub scheduler_enabled: bool,
}

/// 200 when the queue store answers within the timeout, 503 otherwise.
///
/// Counting statuses goes through the same store the ticks use, so a
/// healthy response means a tick could read the queue right now.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let counts = match tokio::time::timeout(STORE_TIMEOUT, state.deps.queue.status_counts()).await
    {
        Ok(Ok(counts)) => Ok(counts),
        Ok(Err(e)) => Err(format!("queue store unavailable: {}", e)),
        Err(_) => Err(format!(
            "queue store did not answer within {}s",
            STORE_TIMEOUT.as_secs()
        )),
    };

    let (status, response) = match counts {
        Ok(counts) => (
            StatusCode::OK,
            HealthResponse {
                healthy: true,
                queue: Some(counts),
                error: None,
                scheduler_enabled: state.scheduler_enabled,
            },
        ),
        Err(error) => {
            warn!(error = %error, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthResponse {
                    healthy: false,
                    queue: None,
                    error: Some(error),
                    scheduler_enabled: state.scheduler_enabled,
                },
            )
        }
    };

    (status, Json(response))
}
