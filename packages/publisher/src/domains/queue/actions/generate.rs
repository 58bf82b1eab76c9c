//! Generation worker.
//!
//! Drives one queue item through claim → generate → resolve taxonomy →
//! create and link the draft. The claim is a conditional status write, so two
//! overlapping calls on the same item cannot both get past it. Any failure
//! after the claim is written back to the item as `failed` before the error
//! is returned.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::common::{PipelineError, QueueItemId, TermId};
use crate::domains::posts::actions::post_slug;
use crate::domains::posts::models::{NewDraft, Post};
use crate::domains::queue::models::{QueueItem, QueueStatus, QueueTransition};
use crate::domains::taxonomy::{resolve_terms, TaxonomyKind};
use crate::kernel::{GeneratedPost, GenerationRequest, ServerDeps};

/// States an item can be claimed from
const CLAIMABLE: [QueueStatus; 2] = [QueueStatus::Pending, QueueStatus::Failed];

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutcome {
    pub item: QueueItem,
    pub post: Post,
}

/// Generate a draft for one queue item.
///
/// Fails with `AlreadyClaimed` if another invocation holds the item,
/// `InvalidState` if it is past generation, `NotFound` for an unknown id.
/// None of those touch the item.
pub async fn generate_item(
    id: QueueItemId,
    deps: &ServerDeps,
) -> Result<GenerateOutcome, PipelineError> {
    let item = claim(id, deps).await?;
    info!(item_id = %id, title = %item.title, "Queue item claimed for generation");

    match run(&item, deps).await {
        Ok(outcome) => {
            info!(
                item_id = %id,
                post_id = %outcome.post.id,
                slug = %outcome.post.slug,
                "Queue item generated"
            );
            Ok(outcome)
        }
        Err(err) => {
            record_failure(id, &err, deps).await;
            Err(err)
        }
    }
}

async fn claim(id: QueueItemId, deps: &ServerDeps) -> Result<QueueItem, PipelineError> {
    if let Some(item) = deps
        .queue
        .transition(id, &CLAIMABLE, &QueueTransition::Claim)
        .await?
    {
        return Ok(item);
    }

    match deps.queue.find_by_id(id).await? {
        None => Err(PipelineError::not_found("queue item", id)),
        Some(current) if current.status == QueueStatus::Generating => {
            debug!(item_id = %id, "Claim lost, item already generating");
            Err(PipelineError::AlreadyClaimed(id))
        }
        Some(current) => Err(PipelineError::InvalidState {
            id,
            status: current.status.to_string(),
            action: "generated",
        }),
    }
}

async fn run(item: &QueueItem, deps: &ServerDeps) -> Result<GenerateOutcome, PipelineError> {
    let request = GenerationRequest {
        title: item.title.clone(),
        known_categories: deps.taxonomy.names(TaxonomyKind::Category).await?,
        known_tags: deps.taxonomy.names(TaxonomyKind::Tag).await?,
    };

    let generated = deps
        .generator
        .generate(&request)
        .await
        .map_err(|e| PipelineError::Generation(e.to_string()))?;
    validate(&generated)?;

    let category_ids = dedup(
        resolve_terms(deps.taxonomy.as_ref(), TaxonomyKind::Category, &generated.categories).await?,
    );
    let tag_ids = dedup(
        resolve_terms(deps.taxonomy.as_ref(), TaxonomyKind::Tag, &generated.tags).await?,
    );

    let slug = post_slug(deps.posts.as_ref(), &item.title, None).await?;

    let draft = NewDraft {
        title: item.title.clone(),
        slug,
        description: generated.description,
        content: generated.content,
        excerpt: generated.excerpt,
        category_ids,
        tag_ids,
    };

    // Draft insert and link are one write: a lost link leaves no orphan post
    match deps.queue.link_draft(item.id, &draft).await? {
        Some((item, post)) => Ok(GenerateOutcome { item, post }),
        None => {
            let status = deps
                .queue
                .find_by_id(item.id)
                .await?
                .map(|i| i.status.to_string())
                .unwrap_or_else(|| "deleted".to_string());
            warn!(
                item_id = %item.id,
                status = %status,
                "Item left generating before its draft was linked"
            );
            Err(PipelineError::InvalidState {
                id: item.id,
                status,
                action: "linked to its draft",
            })
        }
    }
}

fn validate(generated: &GeneratedPost) -> Result<(), PipelineError> {
    let required = [
        ("description", &generated.description),
        ("content", &generated.content),
        ("excerpt", &generated.excerpt),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(PipelineError::Generation(format!(
                "generation response missing required field: {}",
                field
            )));
        }
    }
    Ok(())
}

fn dedup(ids: Vec<TermId>) -> Vec<TermId> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

/// Write `failed` with the error message. Only applies while the item is
/// still `generating`.
async fn record_failure(id: QueueItemId, err: &PipelineError, deps: &ServerDeps) {
    let message = err.to_string();
    warn!(item_id = %id, error = %message, "Queue item generation failed");

    let transition = QueueTransition::Failed { error: message };
    if let Err(e) = deps
        .queue
        .transition(id, &[QueueStatus::Generating], &transition)
        .await
    {
        error!(item_id = %id, error = %e, "Failed to record generation failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_fields() {
        let generated = GeneratedPost {
            description: "d".into(),
            content: "  ".into(),
            excerpt: "e".into(),
            ..Default::default()
        };

        let err = validate(&generated).unwrap_err();
        assert_eq!(
            err.to_string(),
            "generation response missing required field: content"
        );
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let a = TermId::new();
        let b = TermId::new();
        assert_eq!(dedup(vec![a, b, a, b, a]), vec![a, b]);
    }
}
