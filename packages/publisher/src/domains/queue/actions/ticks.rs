//! Scheduler ticks. Each tick handles at most one item per lane and
//! reports every attempt independently.

use serde::Serialize;
use tracing::info;

use super::alert::{check_low_queue, AlertOutcome};
use super::generate::generate_item;
use super::publish::{publish_item, PublishOutcome};
use crate::common::{PipelineError, PostId, QueueItemId};
use crate::domains::queue::models::{QueueItem, QueueStatus};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    Generated { post_id: PostId, slug: String },
    Failed { error: String },
    Published { post_id: PostId },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TickEntry {
    pub item_id: QueueItemId,
    pub title: String,
    #[serde(flatten)]
    pub outcome: TickOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub entries: Vec<TickEntry>,
    /// Pending count after a generate tick
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_queue_alert: Option<AlertOutcome>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Generate the oldest pending item and retry the oldest failed one, then
/// run the low-queue check.
///
/// Both candidates are picked before either runs, so an item that fails in
/// this tick is not retried until the next one.
pub async fn generate_tick(deps: &ServerDeps) -> Result<TickReport, PipelineError> {
    let pending = deps.queue.find_oldest_by_status(QueueStatus::Pending).await?;
    let failed = deps.queue.find_oldest_by_status(QueueStatus::Failed).await?;

    let mut report = TickReport::default();
    for item in [pending, failed].into_iter().flatten() {
        let outcome = match generate_item(item.id, deps).await {
            Ok(done) => TickOutcome::Generated {
                post_id: done.post.id,
                slug: done.post.slug,
            },
            Err(err) => failure_outcome(err),
        };
        report.entries.push(entry(item, outcome));
    }

    if report.is_empty() {
        info!("Generate tick: nothing to process");
    }

    let check = check_low_queue(deps).await;
    report.pending_remaining = check.pending;
    report.low_queue_alert = Some(check.alert);

    info!(
        attempted = report.entries.len(),
        pending = ?report.pending_remaining,
        "Generate tick complete"
    );
    Ok(report)
}

/// Promote the oldest generated item.
pub async fn publish_tick(deps: &ServerDeps) -> Result<TickReport, PipelineError> {
    let mut report = TickReport::default();

    let Some(item) = deps
        .queue
        .find_oldest_by_status(QueueStatus::Generated)
        .await?
    else {
        info!("Publish tick: nothing to process");
        return Ok(report);
    };

    let outcome = match publish_item(item.id, deps).await {
        Ok(PublishOutcome::Published { post, .. }) => TickOutcome::Published { post_id: post.id },
        Ok(PublishOutcome::NothingToPublish { reason }) => TickOutcome::Skipped { reason },
        Err(err) => failure_outcome(err),
    };
    report.entries.push(entry(item, outcome));

    info!("Publish tick complete");
    Ok(report)
}

/// Lost races are skips; everything else is a failure for this entry only.
fn failure_outcome(err: PipelineError) -> TickOutcome {
    match &err {
        PipelineError::AlreadyClaimed(_)
        | PipelineError::InvalidState { .. }
        | PipelineError::NotFound { .. } => TickOutcome::Skipped {
            reason: err.to_string(),
        },
        _ => TickOutcome::Failed {
            error: err.to_string(),
        },
    }
}

fn entry(item: QueueItem, outcome: TickOutcome) -> TickEntry {
    TickEntry {
        item_id: item.id,
        title: item.title,
        outcome,
    }
}
