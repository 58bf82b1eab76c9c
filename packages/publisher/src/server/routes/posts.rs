use axum::{
    extract::{Extension, Path, Query},
    Json,
};

use super::caller;
use crate::common::{AuthUser, PostId};
use crate::domains::posts::actions::{self, PostEdit};
use crate::domains::posts::models::{Post, PostFilter};
use crate::server::app::AppState;
use crate::server::error::ApiError;

pub async fn list_posts(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = actions::list_posts(&filter, caller(&user), &state.deps).await?;
    Ok(Json(posts))
}

pub async fn edit_post(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<PostId>,
    Json(edit): Json<PostEdit>,
) -> Result<Json<Post>, ApiError> {
    let post = actions::edit_post(id, edit, caller(&user), &state.deps).await?;
    Ok(Json(post))
}
