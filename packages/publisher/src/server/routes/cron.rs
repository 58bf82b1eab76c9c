//! HTTP scheduler triggers, called by an external cron.

use axum::{extract::Extension, Json};

use crate::domains::queue::actions::{generate_tick, publish_tick, TickReport};
use crate::server::app::AppState;
use crate::server::error::ApiError;

pub async fn cron_generate(
    Extension(state): Extension<AppState>,
) -> Result<Json<TickReport>, ApiError> {
    Ok(Json(generate_tick(&state.deps).await?))
}

pub async fn cron_publish(
    Extension(state): Extension<AppState>,
) -> Result<Json<TickReport>, ApiError> {
    Ok(Json(publish_tick(&state.deps).await?))
}
