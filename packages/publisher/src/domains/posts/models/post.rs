use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use typed_builder::TypedBuilder;

use crate::common::{PostId, TermId};

/// Blog post - created as a draft by the generation worker, later published
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub excerpt: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub category_ids: Vec<TermId>,
    pub tag_ids: Vec<TermId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new unpublished post
#[derive(Debug, Clone)]
pub struct NewDraft {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub excerpt: String,
    pub category_ids: Vec<TermId>,
    pub tag_ids: Vec<TermId>,
}

/// Typed predicates for the admin post listing
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct PostFilter {
    /// Case-insensitive substring of title or excerpt
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub search: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub published: Option<bool>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub created_after: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub created_before: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub category_id: Option<TermId>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub tag_id: Option<TermId>,
    #[builder(default = 50)]
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[builder(default)]
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for PostFilter {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let needle = search.trim().to_lowercase();
            if !post.title.to_lowercase().contains(&needle)
                && !post.excerpt.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.published.is_some_and(|p| p != post.published) {
            return false;
        }
        if self.created_after.is_some_and(|t| post.created_at < t) {
            return false;
        }
        if self.created_before.is_some_and(|t| post.created_at >= t) {
            return false;
        }
        if self
            .category_id
            .is_some_and(|id| !post.category_ids.contains(&id))
        {
            return false;
        }
        if self.tag_id.is_some_and(|id| !post.tag_ids.contains(&id)) {
            return false;
        }
        true
    }
}

/// Post columns plus aggregated taxonomy links
const POST_SELECT: &str = r#"
    SELECT p.*,
           COALESCE(
               (SELECT array_agg(pc.category_id) FROM post_categories pc WHERE pc.post_id = p.id),
               '{}'
           ) AS category_ids,
           COALESCE(
               (SELECT array_agg(pt.tag_id) FROM post_tags pt WHERE pt.post_id = p.id),
               '{}'
           ) AS tag_ids
    FROM posts p
"#;

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Post {
    pub async fn find_by_id(id: PostId, executor: impl PgExecutor<'_>) -> Result<Option<Self>> {
        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = $1", POST_SELECT))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(post)
    }

    pub async fn slug_exists(slug: &str, pool: &PgPool) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1)")
            .bind(slug)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    /// Insert an unpublished post and its taxonomy links on the caller's
    /// transaction. The queue store links the item in the same transaction.
    pub async fn insert_draft(draft: &NewDraft, conn: &mut PgConnection) -> Result<PostId> {
        let id = PostId::new();

        sqlx::query(
            r#"
            INSERT INTO posts (id, title, slug, description, content, excerpt, published)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(&draft.content)
        .bind(&draft.excerpt)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO post_categories (post_id, category_id)
             SELECT $1, UNNEST($2::uuid[])
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(&draft.category_ids)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO post_tags (post_id, tag_id)
             SELECT $1, UNNEST($2::uuid[])
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(&draft.tag_ids)
        .execute(&mut *conn)
        .await?;

        Ok(id)
    }

    /// Set the published flag. Keeps the first timestamp. False if the post is missing.
    pub async fn mark_published(id: PostId, conn: &mut PgConnection) -> Result<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE posts
            SET published = TRUE,
                published_at = COALESCE(published_at, NOW()),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(updated.rows_affected() > 0)
    }

    pub async fn update_title_slug(
        id: PostId,
        title: &str,
        slug: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let updated = sqlx::query(
            "UPDATE posts SET title = $1, slug = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(title)
        .bind(slug)
        .bind(id)
        .execute(pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(id, pool).await
    }

    pub async fn list(filter: &PostFilter, pool: &PgPool) -> Result<Vec<Self>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(POST_SELECT);
        query.push(" WHERE TRUE");

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query
                .push(" AND (p.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.excerpt ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(published) = filter.published {
            query.push(" AND p.published = ").push_bind(published);
        }
        if let Some(after) = filter.created_after {
            query.push(" AND p.created_at >= ").push_bind(after);
        }
        if let Some(before) = filter.created_before {
            query.push(" AND p.created_at < ").push_bind(before);
        }
        if let Some(category_id) = filter.category_id {
            query
                .push(" AND EXISTS (SELECT 1 FROM post_categories pc WHERE pc.post_id = p.id AND pc.category_id = ")
                .push_bind(category_id)
                .push(")");
        }
        if let Some(tag_id) = filter.tag_id {
            query
                .push(" AND EXISTS (SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = ")
                .push_bind(tag_id)
                .push(")");
        }

        query
            .push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let posts = query.build_query_as::<Post>().fetch_all(pool).await?;
        Ok(posts)
    }
}
