//! Promotion driver: flips a generated item's draft to published.

use serde::Serialize;
use tracing::{info, warn};

use crate::common::{PipelineError, QueueItemId};
use crate::domains::posts::models::Post;
use crate::domains::queue::models::{Promotion, QueueItem, QueueStatus};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published { item: QueueItem, post: Post },
    NothingToPublish { reason: String },
}

/// Publish the draft linked to a `generated` item and mark the item
/// `published` in a single store write.
///
/// If that write fails neither row changes, so the next tick retries
/// cleanly. An already-published item or a missing draft is reported, not
/// raised.
pub async fn publish_item(
    id: QueueItemId,
    deps: &ServerDeps,
) -> Result<PublishOutcome, PipelineError> {
    let item = deps
        .queue
        .find_by_id(id)
        .await?
        .ok_or_else(|| PipelineError::not_found("queue item", id))?;

    match item.status {
        QueueStatus::Generated => {}
        QueueStatus::Published => {
            return Ok(nothing(id, "item is already published"));
        }
        other => {
            return Err(PipelineError::InvalidState {
                id,
                status: other.to_string(),
                action: "published",
            });
        }
    }

    let Some(post_id) = item.post_id else {
        warn!(item_id = %id, "Generated item has no linked post");
        return Ok(nothing(id, "item has no linked post"));
    };

    match deps.queue.promote(id, post_id).await? {
        Promotion::Published { item, post } => {
            info!(item_id = %id, post_id = %post_id, slug = %post.slug, "Queue item published");
            Ok(PublishOutcome::Published { item, post })
        }
        Promotion::PostMissing => {
            warn!(item_id = %id, post_id = %post_id, "Linked post is missing");
            Ok(nothing(id, "linked post is missing"))
        }
        Promotion::NotGenerated => Ok(nothing(id, "item was published concurrently")),
    }
}

fn nothing(id: QueueItemId, reason: &str) -> PublishOutcome {
    info!(item_id = %id, reason, "Nothing to publish");
    PublishOutcome::NothingToPublish {
        reason: reason.to_string(),
    }
}
