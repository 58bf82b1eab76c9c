//! Postgres-backed queue store.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{
    Promotion, QueueFilter, QueueItem, QueueItemEdit, QueueStatus, QueueTransition, StatusCounts,
};
use crate::common::{PostId, QueueItemId};
use crate::domains::posts::models::{NewDraft, Post};
use crate::kernel::BaseQueueStore;

#[derive(Clone)]
pub struct PgQueueStore {
    pool: PgPool,
}

impl PgQueueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseQueueStore for PgQueueStore {
    async fn insert_titles(&self, titles: &[String]) -> Result<Vec<QueueItem>> {
        QueueItem::insert_many(titles, &self.pool).await
    }

    async fn find_by_id(&self, id: QueueItemId) -> Result<Option<QueueItem>> {
        QueueItem::find_by_id(id, &self.pool).await
    }

    async fn find_oldest_by_status(&self, status: QueueStatus) -> Result<Option<QueueItem>> {
        QueueItem::find_oldest_by_status(status, &self.pool).await
    }

    async fn count_by_status(&self, status: QueueStatus) -> Result<i64> {
        QueueItem::count_by_status(status, &self.pool).await
    }

    async fn titles_by_status(&self, status: QueueStatus) -> Result<Vec<String>> {
        QueueItem::titles_by_status(status, &self.pool).await
    }

    async fn link_draft(
        &self,
        id: QueueItemId,
        draft: &NewDraft,
    ) -> Result<Option<(QueueItem, Post)>> {
        QueueItem::link_draft(id, draft, &self.pool).await
    }

    async fn promote(&self, id: QueueItemId, post_id: PostId) -> Result<Promotion> {
        QueueItem::promote(id, post_id, &self.pool).await
    }

    async fn transition(
        &self,
        id: QueueItemId,
        from: &[QueueStatus],
        transition: &QueueTransition,
    ) -> Result<Option<QueueItem>> {
        QueueItem::transition(id, from, transition, &self.pool).await
    }

    async fn update_details(
        &self,
        id: QueueItemId,
        edit: &QueueItemEdit,
    ) -> Result<Option<QueueItem>> {
        QueueItem::update_details(id, edit, &self.pool).await
    }

    async fn delete_editable(&self, id: QueueItemId) -> Result<bool> {
        QueueItem::delete_editable(id, &self.pool).await
    }

    async fn list(&self, filter: &QueueFilter) -> Result<Vec<QueueItem>> {
        QueueItem::list(filter, &self.pool).await
    }

    async fn status_counts(&self) -> Result<StatusCounts> {
        QueueItem::status_counts(&self.pool).await
    }
}
