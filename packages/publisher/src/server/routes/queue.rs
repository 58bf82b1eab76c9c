//! Admin queue API.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::caller;
use crate::common::{AuthUser, QueueItemId};
use crate::domains::queue::actions::{self, GenerateOutcome, QueueOverview};
use crate::domains::queue::models::{QueueFilter, QueueItem, QueueItemEdit};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddTitle {
    pub title: String,
}

/// Either an explicit list or newline-separated text
#[derive(Debug, Deserialize)]
pub struct AddTitles {
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl AddTitles {
    fn into_titles(self) -> Vec<String> {
        let mut titles = self.titles;
        if let Some(text) = self.text {
            titles.extend(text.lines().map(String::from));
        }
        titles
    }
}

pub async fn list_queue(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Query(filter): Query<QueueFilter>,
) -> Result<Json<QueueOverview>, ApiError> {
    let overview = actions::list_queue(&filter, caller(&user), &state.deps).await?;
    Ok(Json(overview))
}

pub async fn add_title(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(body): Json<AddTitle>,
) -> Result<(StatusCode, Json<QueueItem>), ApiError> {
    let item = actions::add_title(&body.title, caller(&user), &state.deps).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn add_titles(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(body): Json<AddTitles>,
) -> Result<(StatusCode, Json<Vec<QueueItem>>), ApiError> {
    let titles = body.into_titles();
    let items = actions::add_titles(&titles, caller(&user), &state.deps).await?;
    Ok((StatusCode::CREATED, Json(items)))
}

pub async fn edit_item(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<QueueItemId>,
    Json(edit): Json<QueueItemEdit>,
) -> Result<Json<QueueItem>, ApiError> {
    let item = actions::edit_item(id, edit, caller(&user), &state.deps).await?;
    Ok(Json(item))
}

pub async fn delete_item(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<QueueItemId>,
) -> Result<StatusCode, ApiError> {
    actions::delete_item(id, caller(&user), &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn retry_item(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<QueueItemId>,
) -> Result<Json<QueueItem>, ApiError> {
    let item = actions::retry_item(id, caller(&user), &state.deps).await?;
    Ok(Json(item))
}

pub async fn generate_item(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<QueueItemId>,
) -> Result<Json<GenerateOutcome>, ApiError> {
    let outcome = actions::force_generate(id, caller(&user), &state.deps).await?;
    Ok(Json(outcome))
}

pub async fn reset_item(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<QueueItemId>,
) -> Result<Json<QueueItem>, ApiError> {
    let item = actions::reset_stalled(id, caller(&user), &state.deps).await?;
    Ok(Json(item))
}
