//! Test fixtures for callers and queue contents.
//!
//! Queue items are created through the store trait, the same way the admin
//! actions create them.

use std::sync::Arc;

use publisher_core::common::{AuthUser, MemberId};
use publisher_core::domains::queue::models::QueueItem;
use publisher_core::kernel::ServerDeps;

/// Caller whose token carries the admin flag
pub fn admin_user() -> AuthUser {
    AuthUser {
        member_id: MemberId::new(),
        email: "editor@example.com".to_string(),
        is_admin: true,
    }
}

/// Signed-in caller without admin rights
pub fn reader_user() -> AuthUser {
    AuthUser {
        member_id: MemberId::new(),
        email: "reader@example.com".to_string(),
        is_admin: false,
    }
}

/// Append `titles` to the queue as pending items, in order
pub async fn seed_titles(deps: &Arc<ServerDeps>, titles: &[&str]) -> Vec<QueueItem> {
    let titles: Vec<String> = titles.iter().map(|t| t.to_string()).collect();
    deps.queue
        .insert_titles(&titles)
        .await
        .expect("Failed to seed queue titles")
}

/// `count` numbered pending titles: "Title 01", "Title 02", ...
pub async fn seed_numbered(deps: &Arc<ServerDeps>, count: usize) -> Vec<QueueItem> {
    let titles: Vec<String> = (1..=count).map(|n| format!("Title {:02}", n)).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    seed_titles(deps, &refs).await
}

