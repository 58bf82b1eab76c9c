// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The queue state machine, resolvers and ticks are domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseQueueStore, BaseContentGenerator)

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{PostId, QueueItemId, TermId};
use crate::domains::posts::models::{NewDraft, Post, PostFilter};
use crate::domains::queue::models::{
    Promotion, QueueFilter, QueueItem, QueueItemEdit, QueueStatus, QueueTransition, StatusCounts,
};
use crate::domains::taxonomy::models::{TaxonomyKind, Term};

// =============================================================================
// Queue Store (Infrastructure - durable ordered work queue)
// =============================================================================

#[async_trait]
pub trait BaseQueueStore: Send + Sync {
    /// Append titles to the tail of the queue as `pending`, in order.
    async fn insert_titles(&self, titles: &[String]) -> Result<Vec<QueueItem>>;

    async fn find_by_id(&self, id: QueueItemId) -> Result<Option<QueueItem>>;

    /// Lowest-position item in `status`
    async fn find_oldest_by_status(&self, status: QueueStatus) -> Result<Option<QueueItem>>;

    async fn count_by_status(&self, status: QueueStatus) -> Result<i64>;

    /// Titles in `status`, in position order
    async fn titles_by_status(&self, status: QueueStatus) -> Result<Vec<String>>;

    /// Atomic conditional write. Applies `transition` only while the stored
    /// status is one of `from`; returns `None` otherwise (or if the id is unknown).
    async fn transition(
        &self,
        id: QueueItemId,
        from: &[QueueStatus],
        transition: &QueueTransition,
    ) -> Result<Option<QueueItem>>;

    /// Insert the draft and link it to a `generating` item as one write.
    /// `None` with no post created when the item has left `generating`.
    async fn link_draft(&self, id: QueueItemId, draft: &NewDraft)
        -> Result<Option<(QueueItem, Post)>>;

    /// Publish the linked post and mark a `generated` item `published` as one write.
    async fn promote(&self, id: QueueItemId, post_id: PostId) -> Result<Promotion>;

    /// Edit title/position. Returns `None` unless the item is pending or failed.
    async fn update_details(&self, id: QueueItemId, edit: &QueueItemEdit)
        -> Result<Option<QueueItem>>;

    /// Delete while pending or failed. Returns false if nothing was removed.
    async fn delete_editable(&self, id: QueueItemId) -> Result<bool>;

    async fn list(&self, filter: &QueueFilter) -> Result<Vec<QueueItem>>;

    async fn status_counts(&self) -> Result<StatusCounts>;
}

// =============================================================================
// Post Store (Infrastructure - draft/published records)
// =============================================================================

#[async_trait]
pub trait BasePostStore: Send + Sync {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>>;

    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    async fn update_title_slug(&self, id: PostId, title: &str, slug: &str)
        -> Result<Option<Post>>;

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>>;
}

// =============================================================================
// Taxonomy Store (Infrastructure - categories and tags)
// =============================================================================

#[async_trait]
pub trait BaseTaxonomyStore: Send + Sync {
    async fn find_by_id(&self, kind: TaxonomyKind, id: TermId) -> Result<Option<Term>>;

    /// Exact-name lookup
    async fn find_by_name(&self, kind: TaxonomyKind, name: &str) -> Result<Option<Term>>;

    async fn slug_exists(&self, kind: TaxonomyKind, slug: &str) -> Result<bool>;

    /// All names of `kind`, sorted
    async fn names(&self, kind: TaxonomyKind) -> Result<Vec<String>>;

    async fn list(&self, kind: TaxonomyKind) -> Result<Vec<Term>>;

    /// Create a term. If the name was taken concurrently, returns the existing row.
    async fn create(&self, kind: TaxonomyKind, name: &str, slug: &str) -> Result<Term>;

    async fn update(&self, kind: TaxonomyKind, id: TermId, name: &str, slug: &str)
        -> Result<Option<Term>>;
}

// =============================================================================
// Content Generator Trait (Infrastructure - LLM completion)
// =============================================================================

/// What the generator is asked to write about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub title: String,
    /// Existing category names the model should prefer over new ones
    pub known_categories: Vec<String>,
    pub known_tags: Vec<String>,
}

/// Generator output. Missing fields deserialize empty and are rejected by the worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedPost {
    /// One or two sentence summary used for meta descriptions
    #[serde(default)]
    pub description: String,
    /// Full article body in Markdown
    #[serde(default)]
    pub content: String,
    /// Short teaser shown in listings
    #[serde(default)]
    pub excerpt: String,
    /// Category names, reusing known ones where they fit
    #[serde(default)]
    pub categories: Vec<String>,
    /// Tag names, reusing known ones where they fit
    #[serde(default)]
    pub tags: Vec<String>,
}

#[async_trait]
pub trait BaseContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedPost>;
}

// =============================================================================
// Alert Notifier Trait (Infrastructure - outbound email)
// =============================================================================

#[async_trait]
pub trait BaseAlertNotifier: Send + Sync {
    /// Tell the operator the queue is running low. `titles` are in queue order.
    async fn send_low_queue_alert(&self, titles: &[String]) -> Result<()>;
}

// =============================================================================
// Rate Limit Store Trait (Infrastructure - fixed-window counters)
// =============================================================================

#[async_trait]
pub trait BaseRateLimitStore: Send + Sync {
    /// Current count for `key` in its live window, if any.
    async fn get(&self, key: &str) -> Result<Option<u32>>;

    /// Count one hit. Starts a new `window` when none is live. Returns the new count.
    async fn increment(&self, key: &str, window: Duration) -> Result<u32>;

    /// Drop the counter for `key`.
    async fn expire(&self, key: &str) -> Result<()>;

    /// Remove all elapsed windows. Returns how many were removed.
    async fn purge_expired(&self) -> Result<usize>;
}
