//! Server dependencies for actions (using traits for testability)
//!
//! This module provides the central dependency container used by all domain actions.
//! All external services use trait abstractions to enable testing.

use std::sync::Arc;

use sqlx::PgPool;

use crate::common::auth::HasAuthContext;
use crate::domains::posts::PgPostStore;
use crate::domains::queue::PgQueueStore;
use crate::domains::taxonomy::PgTaxonomyStore;
use crate::kernel::{
    BaseAlertNotifier, BaseContentGenerator, BasePostStore, BaseQueueStore, BaseRateLimitStore,
    BaseTaxonomyStore,
};

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub queue: Arc<dyn BaseQueueStore>,
    pub posts: Arc<dyn BasePostStore>,
    pub taxonomy: Arc<dyn BaseTaxonomyStore>,
    /// Content generation (LLM) used by the generation worker
    pub generator: Arc<dyn BaseContentGenerator>,
    /// Low-queue alert delivery
    pub notifier: Arc<dyn BaseAlertNotifier>,
    pub rate_limits: Arc<dyn BaseRateLimitStore>,
    /// Emails granted admin regardless of the token flag
    pub admin_emails: Vec<String>,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn BaseQueueStore>,
        posts: Arc<dyn BasePostStore>,
        taxonomy: Arc<dyn BaseTaxonomyStore>,
        generator: Arc<dyn BaseContentGenerator>,
        notifier: Arc<dyn BaseAlertNotifier>,
        rate_limits: Arc<dyn BaseRateLimitStore>,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            queue,
            posts,
            taxonomy,
            generator,
            notifier,
            rate_limits,
            admin_emails,
        }
    }

    /// Postgres-backed stores sharing one pool
    pub fn with_postgres(
        pool: PgPool,
        generator: Arc<dyn BaseContentGenerator>,
        notifier: Arc<dyn BaseAlertNotifier>,
        rate_limits: Arc<dyn BaseRateLimitStore>,
        admin_emails: Vec<String>,
    ) -> Self {
        Self::new(
            Arc::new(PgQueueStore::new(pool.clone())),
            Arc::new(PgPostStore::new(pool.clone())),
            Arc::new(PgTaxonomyStore::new(pool)),
            generator,
            notifier,
            rate_limits,
            admin_emails,
        )
    }
}

/// Implement HasAuthContext for ServerDeps to enable authorization checks
impl HasAuthContext for ServerDeps {
    fn admin_emails(&self) -> &[String] {
        &self.admin_emails
    }
}
