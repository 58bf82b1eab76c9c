//! Admin queue actions - entry-point functions for the queue API
//!
//! Every action checks the caller before touching the store. Status
//! guards are enforced by the store's conditional writes; the pre-reads
//! here only pick the right rejection.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::generate::{generate_item, GenerateOutcome};
use crate::common::auth::{Actor, AdminCapability, AuthUser};
use crate::common::{PipelineError, QueueItemId};
use crate::domains::queue::models::{
    QueueFilter, QueueItem, QueueItemEdit, QueueStatus, QueueTransition, StatusCounts,
};
use crate::kernel::ServerDeps;

/// Minutes an item must sit in `generating` before an operator may reset it.
pub const STALL_THRESHOLD_MINUTES: i64 = 15;

/// Error message recorded on an item reset by an operator
pub const RESET_MESSAGE: &str = "reset by operator";

#[derive(Debug, Clone, Serialize)]
pub struct QueueOverview {
    pub items: Vec<QueueItem>,
    pub counts: StatusCounts,
}

async fn authorize(
    caller: Option<&AuthUser>,
    capability: AdminCapability,
    deps: &ServerDeps,
) -> Result<(), PipelineError> {
    Actor::from_caller(caller)?
        .can(capability)
        .check(deps)
        .await?;
    Ok(())
}

/// Items in queue order plus per-status counts for the whole queue.
pub async fn list_queue(
    filter: &QueueFilter,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<QueueOverview, PipelineError> {
    authorize(caller, AdminCapability::ManageQueue, deps).await?;

    let items = deps.queue.list(filter).await?;
    let counts = deps.queue.status_counts().await?;
    Ok(QueueOverview { items, counts })
}

pub async fn add_title(
    title: &str,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<QueueItem, PipelineError> {
    authorize(caller, AdminCapability::ManageQueue, deps).await?;

    let title = title.trim();
    if title.is_empty() {
        return Err(PipelineError::InvalidInput("title is required".into()));
    }

    let mut items = deps.queue.insert_titles(&[title.to_string()]).await?;
    let item = items
        .pop()
        .ok_or_else(|| anyhow::anyhow!("insert returned no rows"))?;

    info!(item_id = %item.id, position = item.position, "Queue item added");
    Ok(item)
}

/// Bulk add. Blank entries are dropped; at least one title must remain.
pub async fn add_titles(
    titles: &[String],
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Vec<QueueItem>, PipelineError> {
    authorize(caller, AdminCapability::ManageQueue, deps).await?;

    let titles: Vec<String> = titles
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    if titles.is_empty() {
        return Err(PipelineError::InvalidInput(
            "at least one non-empty title is required".into(),
        ));
    }

    let items = deps.queue.insert_titles(&titles).await?;
    info!(count = items.len(), "Queue items added");
    Ok(items)
}

pub async fn edit_item(
    id: QueueItemId,
    edit: QueueItemEdit,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<QueueItem, PipelineError> {
    authorize(caller, AdminCapability::ManageQueue, deps).await?;

    if edit.is_empty() {
        return Err(PipelineError::InvalidInput("nothing to update".into()));
    }

    let edit = QueueItemEdit {
        title: match edit.title.as_deref().map(str::trim) {
            Some("") => return Err(PipelineError::InvalidInput("title cannot be empty".into())),
            other => other.map(String::from),
        },
        position: edit.position,
    };

    require_editable(id, "edited", deps).await?;

    match deps.queue.update_details(id, &edit).await? {
        Some(item) => {
            info!(item_id = %id, "Queue item edited");
            Ok(item)
        }
        None => Err(rejection(id, "edited", deps).await),
    }
}

pub async fn delete_item(
    id: QueueItemId,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<(), PipelineError> {
    authorize(caller, AdminCapability::ManageQueue, deps).await?;
    require_editable(id, "deleted", deps).await?;

    if deps.queue.delete_editable(id).await? {
        info!(item_id = %id, "Queue item deleted");
        Ok(())
    } else {
        Err(rejection(id, "deleted", deps).await)
    }
}

/// failed → pending. Title and position are untouched.
pub async fn retry_item(
    id: QueueItemId,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<QueueItem, PipelineError> {
    authorize(caller, AdminCapability::ManageQueue, deps).await?;

    match deps
        .queue
        .transition(id, &[QueueStatus::Failed], &QueueTransition::Retry)
        .await?
    {
        Some(item) => {
            info!(item_id = %id, "Queue item re-armed");
            Ok(item)
        }
        None => Err(rejection(id, "retried", deps).await),
    }
}

/// Run the generation worker on one pending or failed item now.
pub async fn force_generate(
    id: QueueItemId,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<GenerateOutcome, PipelineError> {
    authorize(caller, AdminCapability::TriggerGeneration, deps).await?;

    info!(item_id = %id, "Admin-triggered generation");
    generate_item(id, deps).await
}

/// Move an item stuck in `generating` to `failed` so it can be retried.
pub async fn reset_stalled(
    id: QueueItemId,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<QueueItem, PipelineError> {
    authorize(caller, AdminCapability::ManageQueue, deps).await?;

    let item = deps
        .queue
        .find_by_id(id)
        .await?
        .ok_or_else(|| PipelineError::not_found("queue item", id))?;

    if item.status != QueueStatus::Generating {
        return Err(PipelineError::InvalidState {
            id,
            status: item.status.to_string(),
            action: "reset",
        });
    }

    let stalled_for = Utc::now() - item.updated_at;
    if stalled_for.num_minutes() < STALL_THRESHOLD_MINUTES {
        return Err(PipelineError::InvalidInput(format!(
            "item has been generating for {} minutes; reset is allowed after {}",
            stalled_for.num_minutes(),
            STALL_THRESHOLD_MINUTES
        )));
    }

    let transition = QueueTransition::Failed {
        error: RESET_MESSAGE.to_string(),
    };
    match deps
        .queue
        .transition(id, &[QueueStatus::Generating], &transition)
        .await?
    {
        Some(item) => {
            info!(item_id = %id, "Stalled queue item reset");
            Ok(item)
        }
        None => Err(rejection(id, "reset", deps).await),
    }
}

async fn require_editable(
    id: QueueItemId,
    action: &'static str,
    deps: &ServerDeps,
) -> Result<(), PipelineError> {
    let item = deps
        .queue
        .find_by_id(id)
        .await?
        .ok_or_else(|| PipelineError::not_found("queue item", id))?;

    if !item.status.is_editable() {
        return Err(PipelineError::InvalidState {
            id,
            status: item.status.to_string(),
            action,
        });
    }
    Ok(())
}

/// Explain why a conditional write matched nothing.
async fn rejection(id: QueueItemId, action: &'static str, deps: &ServerDeps) -> PipelineError {
    match deps.queue.find_by_id(id).await {
        Ok(Some(item)) => PipelineError::InvalidState {
            id,
            status: item.status.to_string(),
            action,
        },
        Ok(None) => PipelineError::not_found("queue item", id),
        Err(e) => PipelineError::Store(e),
    }
}
