use thiserror::Error;
use uuid::Uuid;

use super::auth::AuthError;
use super::utils::slug::SlugError;
use super::QueueItemId;

/// Errors surfaced by pipeline actions (queue, posts, taxonomy).
///
/// Store and client failures arrive as `anyhow::Error` and are carried in
/// [`PipelineError::Store`]; everything else is a rejection the caller can act on.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Empty title, blank name, malformed input. Nothing was written.
    #[error("{0}")]
    InvalidInput(String),

    /// The item exists but its status does not allow the requested action.
    #[error("queue item {id} is {status} and cannot be {action}")]
    InvalidState {
        id: QueueItemId,
        status: String,
        action: &'static str,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// Another invocation moved the item out of the expected status first.
    #[error("queue item {0} is already being processed")]
    AlreadyClaimed(QueueItemId),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    /// The content generator failed or returned an incomplete payload.
    #[error("{0}")]
    Generation(String),

    #[error(transparent)]
    Slug(#[from] SlugError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
