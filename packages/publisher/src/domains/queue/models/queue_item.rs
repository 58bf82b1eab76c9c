use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use typed_builder::TypedBuilder;

use crate::common::{PostId, QueueItemId};
use crate::domains::posts::models::{NewDraft, Post};

/// Advisory lock key serialising position assignment across concurrent inserts.
const POSITION_LOCK_KEY: i64 = 0x5155_4555_4954_454d;

/// One title waiting to become a post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub title: String,
    pub position: i32,
    pub status: QueueStatus,
    pub post_id: Option<PostId>,
    pub error_msg: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Status state machine
// =============================================================================

/// pending → generating → generated → published, with generating → failed
/// and failed → pending (retry) as the only other edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "queue_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Generating,
    Generated,
    Published,
    Failed,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 5] = [
        QueueStatus::Pending,
        QueueStatus::Generating,
        QueueStatus::Generated,
        QueueStatus::Published,
        QueueStatus::Failed,
    ];

    /// States from which an admin may edit, delete or force-generate.
    pub const EDITABLE: [QueueStatus; 2] = [QueueStatus::Pending, QueueStatus::Failed];

    pub fn is_editable(&self) -> bool {
        Self::EDITABLE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Generating => "generating",
            QueueStatus::Generated => "generated",
            QueueStatus::Published => "published",
            QueueStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueueStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(QueueStatus::Pending),
            "generating" => Ok(QueueStatus::Generating),
            "generated" => Ok(QueueStatus::Generated),
            "published" => Ok(QueueStatus::Published),
            "failed" => Ok(QueueStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid queue status: {}", s)),
        }
    }
}

/// A status write together with the fields that must change with it.
///
/// Each variant keeps `post_id`/`error_msg` consistent with its target
/// status, so a transition can never leave the row violating the link
/// invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueTransition {
    /// pending|failed → generating; clears any previous error
    Claim,
    /// generating → generated; links the draft
    Generated { post_id: PostId },
    /// generating → failed; records the error, no post link
    Failed { error: String },
    /// failed → pending
    Retry,
    /// generated → published
    Published,
}

impl QueueTransition {
    pub fn target(&self) -> QueueStatus {
        match self {
            QueueTransition::Claim => QueueStatus::Generating,
            QueueTransition::Generated { .. } => QueueStatus::Generated,
            QueueTransition::Failed { .. } => QueueStatus::Failed,
            QueueTransition::Retry => QueueStatus::Pending,
            QueueTransition::Published => QueueStatus::Published,
        }
    }

    /// Apply to an in-memory copy (used by the memory store).
    pub fn apply(&self, item: &mut QueueItem) {
        item.status = self.target();
        item.updated_at = Utc::now();
        match self {
            QueueTransition::Claim | QueueTransition::Retry => {
                item.error_msg = None;
            }
            QueueTransition::Generated { post_id } => {
                item.post_id = Some(*post_id);
                item.error_msg = None;
            }
            QueueTransition::Failed { error } => {
                item.error_msg = Some(error.clone());
                item.post_id = None;
            }
            QueueTransition::Published => {}
        }
    }
}

/// Result of [`QueueItem::promote`]
#[derive(Debug, Clone)]
pub enum Promotion {
    Published { item: QueueItem, post: Post },
    /// Item was not `generated` with that post linked; nothing written
    NotGenerated,
    /// Linked post does not exist; nothing written
    PostMissing,
}

/// Number of items per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub generating: i64,
    pub generated: i64,
    pub published: i64,
    pub failed: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: QueueStatus, count: i64) {
        match status {
            QueueStatus::Pending => self.pending += count,
            QueueStatus::Generating => self.generating += count,
            QueueStatus::Generated => self.generated += count,
            QueueStatus::Published => self.published += count,
            QueueStatus::Failed => self.failed += count,
        }
    }

    pub fn total(&self) -> i64 {
        self.pending + self.generating + self.generated + self.published + self.failed
    }
}

/// Admin list filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TypedBuilder)]
pub struct QueueFilter {
    /// Case-insensitive substring of the title
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub search: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub status: Option<QueueStatus>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub created_after: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub created_before: Option<DateTime<Utc>>,
}

impl QueueFilter {
    pub fn matches(&self, item: &QueueItem) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            if !item
                .title
                .to_lowercase()
                .contains(&search.trim().to_lowercase())
            {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != item.status) {
            return false;
        }
        if self.created_after.is_some_and(|t| item.created_at < t) {
            return false;
        }
        if self.created_before.is_some_and(|t| item.created_at >= t) {
            return false;
        }
        true
    }

    fn push_where(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE TRUE");
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query
                .push(" AND title ILIKE ")
                .push_bind(format!("%{}%", search.trim()));
        }
        if let Some(status) = self.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(after) = self.created_after {
            query.push(" AND created_at >= ").push_bind(after);
        }
        if let Some(before) = self.created_before {
            query.push(" AND created_at < ").push_bind(before);
        }
    }
}

/// Title/position edits. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueItemEdit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

impl QueueItemEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.position.is_none()
    }
}

fn editable_statuses() -> Vec<String> {
    QueueStatus::EDITABLE
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl QueueItem {
    pub async fn find_by_id(id: QueueItemId, pool: &PgPool) -> Result<Option<Self>> {
        let item = sqlx::query_as::<_, QueueItem>("SELECT * FROM queue_items WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(item)
    }

    /// Oldest item (lowest position) in the given status
    pub async fn find_oldest_by_status(status: QueueStatus, pool: &PgPool) -> Result<Option<Self>> {
        let item = sqlx::query_as::<_, QueueItem>(
            "SELECT * FROM queue_items
             WHERE status = $1
             ORDER BY position ASC, created_at ASC
             LIMIT 1",
        )
        .bind(status)
        .fetch_optional(pool)
        .await?;
        Ok(item)
    }

    pub async fn count_by_status(status: QueueStatus, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_items WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Titles in the given status, in queue order
    pub async fn titles_by_status(status: QueueStatus, pool: &PgPool) -> Result<Vec<String>> {
        let titles: Vec<String> = sqlx::query_scalar(
            "SELECT title FROM queue_items
             WHERE status = $1
             ORDER BY position ASC, created_at ASC",
        )
        .bind(status)
        .fetch_all(pool)
        .await?;
        Ok(titles)
    }

    /// Append titles to the tail of the queue, in order.
    ///
    /// Position is `max(position) + 1` computed under a transaction-scoped
    /// advisory lock, so concurrent inserts never share a position.
    pub async fn insert_many(titles: &[String], pool: &PgPool) -> Result<Vec<Self>> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(POSITION_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let max: Option<i32> = sqlx::query_scalar("SELECT MAX(position) FROM queue_items")
            .fetch_one(&mut *tx)
            .await?;
        let mut next = max.unwrap_or(0);

        let mut items = Vec::with_capacity(titles.len());
        for title in titles {
            next += 1;
            let item = sqlx::query_as::<_, QueueItem>(
                r#"
                INSERT INTO queue_items (id, title, position, status)
                VALUES ($1, $2, $3, 'pending')
                RETURNING *
                "#,
            )
            .bind(QueueItemId::new())
            .bind(title)
            .bind(next)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;
        Ok(items)
    }

    /// Conditional status write: succeeds only while the stored status is one
    /// of `from`. Returns `None` when another writer got there first.
    pub async fn transition(
        id: QueueItemId,
        from: &[QueueStatus],
        transition: &QueueTransition,
        executor: impl PgExecutor<'_>,
    ) -> Result<Option<Self>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE queue_items SET status = ");
        query.push_bind(transition.target());

        match transition {
            QueueTransition::Claim | QueueTransition::Retry => {
                query.push(", error_msg = NULL");
            }
            QueueTransition::Generated { post_id } => {
                query
                    .push(", post_id = ")
                    .push_bind(*post_id)
                    .push(", error_msg = NULL");
            }
            QueueTransition::Failed { error } => {
                query
                    .push(", error_msg = ")
                    .push_bind(error.clone())
                    .push(", post_id = NULL");
            }
            QueueTransition::Published => {}
        }

        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        query
            .push(", updated_at = NOW() WHERE id = ")
            .push_bind(id)
            .push(" AND status::text = ANY(")
            .push_bind(from)
            .push(") RETURNING *");

        let item = query
            .build_query_as::<QueueItem>()
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    /// Insert the draft and link it to a `generating` item in one transaction.
    ///
    /// Returns `None` with nothing written when the item has left
    /// `generating`, so a lost link never leaves an orphan draft behind.
    pub async fn link_draft(
        id: QueueItemId,
        draft: &NewDraft,
        pool: &PgPool,
    ) -> Result<Option<(Self, Post)>> {
        let mut tx = pool.begin().await?;

        let post_id = Post::insert_draft(draft, &mut tx).await?;
        let linked = Self::transition(
            id,
            &[QueueStatus::Generating],
            &QueueTransition::Generated { post_id },
            &mut *tx,
        )
        .await?;

        let Some(item) = linked else {
            tx.rollback().await?;
            return Ok(None);
        };

        let post = Post::find_by_id(post_id, &mut *tx)
            .await?
            .ok_or_else(|| anyhow::anyhow!("post {} missing after insert", post_id))?;
        tx.commit().await?;
        Ok(Some((item, post)))
    }

    /// Mark a `generated` item `published` and publish its post in one
    /// transaction. Either both rows change or neither does.
    pub async fn promote(id: QueueItemId, post_id: PostId, pool: &PgPool) -> Result<Promotion> {
        let mut tx = pool.begin().await?;

        let item = sqlx::query_as::<_, QueueItem>(
            r#"
            UPDATE queue_items
            SET status = 'published', updated_at = NOW()
            WHERE id = $1 AND status = 'generated' AND post_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(item) = item else {
            tx.rollback().await?;
            return Ok(Promotion::NotGenerated);
        };

        if !Post::mark_published(post_id, &mut tx).await? {
            tx.rollback().await?;
            return Ok(Promotion::PostMissing);
        }

        let post = Post::find_by_id(post_id, &mut *tx)
            .await?
            .ok_or_else(|| anyhow::anyhow!("post {} missing after publish", post_id))?;
        tx.commit().await?;
        Ok(Promotion::Published { item, post })
    }

    /// Edit title/position while the item is still pending or failed.
    pub async fn update_details(
        id: QueueItemId,
        edit: &QueueItemEdit,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let item = sqlx::query_as::<_, QueueItem>(
            r#"
            UPDATE queue_items
            SET title = COALESCE($1, title),
                position = COALESCE($2, position),
                updated_at = NOW()
            WHERE id = $3 AND status::text = ANY($4)
            RETURNING *
            "#,
        )
        .bind(edit.title.as_deref())
        .bind(edit.position)
        .bind(id)
        .bind(editable_statuses())
        .fetch_optional(pool)
        .await?;
        Ok(item)
    }

    /// Delete while pending or failed. Returns false if nothing was removed.
    pub async fn delete_editable(id: QueueItemId, pool: &PgPool) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM queue_items WHERE id = $1 AND status::text = ANY($2)")
                .bind(id)
                .bind(editable_statuses())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(filter: &QueueFilter, pool: &PgPool) -> Result<Vec<Self>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM queue_items");
        filter.push_where(&mut query);
        query.push(" ORDER BY position ASC, created_at ASC");

        let items = query.build_query_as::<QueueItem>().fetch_all(pool).await?;
        Ok(items)
    }

    pub async fn status_counts(pool: &PgPool) -> Result<StatusCounts> {
        let rows: Vec<(QueueStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM queue_items GROUP BY status")
                .fetch_all(pool)
                .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(status, count);
        }
        Ok(counts)
    }
}
