//! Low-queue alerter.

use serde::Serialize;
use tracing::{error, info};

use crate::domains::queue::models::QueueStatus;
use crate::kernel::ServerDeps;

/// Alert when this many or fewer titles are still pending.
pub const LOW_QUEUE_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertOutcome {
    NotNeeded,
    Sent { titles: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct LowQueueCheck {
    /// `None` if the count itself could not be read
    pub pending: Option<i64>,
    pub alert: AlertOutcome,
}

/// Count pending items and notify when `0 < pending <= LOW_QUEUE_THRESHOLD`.
///
/// Re-evaluated on every call, so a queue that stays low re-alerts each
/// tick. Failures are logged and reported in the result; this never errors.
pub async fn check_low_queue(deps: &ServerDeps) -> LowQueueCheck {
    let pending = match deps.queue.count_by_status(QueueStatus::Pending).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Low-queue check could not count pending items");
            return LowQueueCheck {
                pending: None,
                alert: AlertOutcome::Failed {
                    error: e.to_string(),
                },
            };
        }
    };

    if pending == 0 || pending > LOW_QUEUE_THRESHOLD {
        return LowQueueCheck {
            pending: Some(pending),
            alert: AlertOutcome::NotNeeded,
        };
    }

    let sent = async {
        let titles = deps.queue.titles_by_status(QueueStatus::Pending).await?;
        deps.notifier.send_low_queue_alert(&titles).await?;
        anyhow::Ok(titles.len())
    }
    .await;

    let alert = match sent {
        Ok(titles) => {
            info!(pending, "Low-queue alert sent");
            AlertOutcome::Sent { titles }
        }
        Err(e) => {
            error!(pending, error = %e, "Low-queue alert failed");
            AlertOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    LowQueueCheck {
        pending: Some(pending),
        alert,
    }
}
