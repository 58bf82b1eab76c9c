// HTTP routes
pub mod cron;
pub mod health;
pub mod posts;
pub mod queue;
pub mod taxonomy;

pub use health::*;

use axum::extract::Extension;

use crate::common::AuthUser;

/// Identity set by the JWT middleware, if any
pub(crate) fn caller(user: &Option<Extension<AuthUser>>) -> Option<&AuthUser> {
    user.as_ref().map(|Extension(user)| user)
}
