//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! In-process equivalents of the HTTP cron triggers, enabled with
//! `SCHEDULER_ENABLED=true`:
//! - generate tick (oldest pending + oldest failed, then low-queue check)
//! - publish tick (oldest generated)
//! - rate-limit window purge, every ten minutes
//!
//! ```text
//! Scheduler
//!     ├─► generate_tick()  ─► generate_item() ×≤2 ─► check_low_queue()
//!     └─► publish_tick()   ─► publish_item()
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::queue::actions::{generate_tick, publish_tick};
use crate::kernel::ServerDeps;

const PURGE_CRON: &str = "0 */10 * * * *";

/// Start all scheduled tasks
pub async fn start_scheduler(
    deps: Arc<ServerDeps>,
    generate_cron: &str,
    publish_cron: &str,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let generate_deps = deps.clone();
    let generate_job = Job::new_async(generate_cron, move |_uuid, _lock| {
        let deps = generate_deps.clone();
        Box::pin(async move {
            match generate_tick(&deps).await {
                Ok(report) => tracing::info!(
                    attempted = report.entries.len(),
                    "Scheduled generate tick finished"
                ),
                Err(e) => tracing::error!("Scheduled generate tick failed: {}", e),
            }
        })
    })?;
    scheduler.add(generate_job).await?;

    let publish_deps = deps.clone();
    let publish_job = Job::new_async(publish_cron, move |_uuid, _lock| {
        let deps = publish_deps.clone();
        Box::pin(async move {
            match publish_tick(&deps).await {
                Ok(report) => tracing::info!(
                    attempted = report.entries.len(),
                    "Scheduled publish tick finished"
                ),
                Err(e) => tracing::error!("Scheduled publish tick failed: {}", e),
            }
        })
    })?;
    scheduler.add(publish_job).await?;

    let purge_deps = deps;
    let purge_job = Job::new_async(PURGE_CRON, move |_uuid, _lock| {
        let deps = purge_deps.clone();
        Box::pin(async move {
            match deps.rate_limits.purge_expired().await {
                Ok(removed) => tracing::debug!(removed, "Purged expired rate-limit windows"),
                Err(e) => tracing::warn!("Rate-limit purge failed: {}", e),
            }
        })
    })?;
    scheduler.add(purge_job).await?;

    scheduler.start().await?;

    tracing::info!(
        generate = generate_cron,
        publish = publish_cron,
        "Scheduled tasks started"
    );
    Ok(scheduler)
}
