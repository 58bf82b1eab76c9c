use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{Post, PostFilter};
use crate::common::utils::SlugProbe;
use crate::common::PostId;
use crate::kernel::BasePostStore;

#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BasePostStore for PgPostStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>> {
        Post::find_by_id(id, &self.pool).await
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Post::slug_exists(slug, &self.pool).await
    }

    async fn update_title_slug(&self, id: PostId, title: &str, slug: &str) -> Result<Option<Post>> {
        Post::update_title_slug(id, title, slug, &self.pool).await
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        Post::list(filter, &self.pool).await
    }
}

/// Slug collision check against existing posts
pub struct PostSlugs<'a>(pub &'a dyn BasePostStore);

#[async_trait]
impl SlugProbe for PostSlugs<'_> {
    async fn exists(&self, candidate: &str) -> Result<bool> {
        self.0.slug_exists(candidate).await
    }
}
