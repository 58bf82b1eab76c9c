//! Admin post actions: listing and title/slug edits.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::models::{Post, PostFilter};
use super::store::PostSlugs;
use crate::common::auth::{Actor, AdminCapability, AuthUser};
use crate::common::utils::{resolve_unique, slugify};
use crate::common::{PipelineError, PostId};
use crate::kernel::{BasePostStore, ServerDeps};

/// Slug used when a title has no retainable characters
pub const FALLBACK_POST_SLUG: &str = "post";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostEdit {
    #[serde(default)]
    pub title: Option<String>,
    /// Explicit slug; derived from the title when absent
    #[serde(default)]
    pub slug: Option<String>,
}

pub async fn list_posts(
    filter: &PostFilter,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Vec<Post>, PipelineError> {
    Actor::from_caller(caller)?
        .can(AdminCapability::ManagePosts)
        .check(deps)
        .await?;

    Ok(deps.posts.list(filter).await?)
}

pub async fn edit_post(
    id: PostId,
    edit: PostEdit,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Post, PipelineError> {
    Actor::from_caller(caller)?
        .can(AdminCapability::ManagePosts)
        .check(deps)
        .await?;

    let current = deps
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| PipelineError::not_found("post", id))?;

    let title = match edit.title.as_deref().map(str::trim) {
        Some("") => return Err(PipelineError::InvalidInput("title cannot be empty".into())),
        Some(title) => title.to_string(),
        None => current.title.clone(),
    };

    let source = edit.slug.as_deref().unwrap_or(title.as_str());
    let slug = post_slug(deps.posts.as_ref(), source, Some(&current.slug)).await?;

    let post = deps
        .posts
        .update_title_slug(id, &title, &slug)
        .await?
        .ok_or_else(|| PipelineError::not_found("post", id))?;

    info!(post_id = %id, slug = %post.slug, "Post updated");
    Ok(post)
}

/// Unique post slug derived from `text`.
pub async fn post_slug(
    posts: &dyn BasePostStore,
    text: &str,
    existing: Option<&str>,
) -> Result<String, PipelineError> {
    let mut base = slugify(text);
    if base.is_empty() {
        base = FALLBACK_POST_SLUG.to_string();
    }

    let probe = PostSlugs(posts);
    Ok(resolve_unique(&base, existing, Some(&probe)).await?)
}
