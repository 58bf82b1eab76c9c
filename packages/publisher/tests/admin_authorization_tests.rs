//! Admin authorization for every admin-facing action.
//!
//! Each action is checked three ways:
//! 1. admin caller succeeds
//! 2. signed-in non-admin gets `AdminRequired`
//! 3. no caller gets `AuthenticationRequired`

mod common;

use std::sync::Arc;

use crate::common::{admin_user, reader_user, seed_titles};
use publisher_core::common::{AuthError, AuthUser, MemberId, PipelineError, PostId};
use publisher_core::domains::posts::actions::{edit_post, list_posts, PostEdit};
use publisher_core::domains::posts::models::PostFilter;
use publisher_core::domains::queue::actions::{
    add_title, delete_item, force_generate, list_queue, retry_item,
};
use publisher_core::domains::queue::models::{QueueFilter, QueueStatus};
use publisher_core::domains::taxonomy::actions::{create_term, list_terms, rename_term};
use publisher_core::domains::taxonomy::TaxonomyKind;
use publisher_core::kernel::{ServerDeps, TestDependencies};

// ============================================================================
// Test Helpers
// ============================================================================

fn assert_admin_required<T: std::fmt::Debug>(result: Result<T, PipelineError>) {
    assert!(
        matches!(
            result,
            Err(PipelineError::Unauthorized(AuthError::AdminRequired))
        ),
        "expected AdminRequired, got {:?}",
        result
    );
}

fn assert_unauthenticated<T: std::fmt::Debug>(result: Result<T, PipelineError>) {
    assert!(
        matches!(
            result,
            Err(PipelineError::Unauthorized(AuthError::AuthenticationRequired))
        ),
        "expected AuthenticationRequired, got {:?}",
        result
    );
}

fn deps() -> Arc<ServerDeps> {
    TestDependencies::new().into_deps()
}

// ============================================================================
// Queue
// ============================================================================

#[tokio::test]
async fn add_title_as_admin_succeeds() {
    let deps = deps();
    let item = add_title("Admin title", Some(&admin_user()), &deps)
        .await
        .unwrap();
    assert_eq!(item.status, QueueStatus::Pending);
}

#[tokio::test]
async fn add_title_as_non_admin_fails() {
    let deps = deps();
    assert_admin_required(add_title("Nope", Some(&reader_user()), &deps).await);

    let overview = list_queue(&QueueFilter::default(), Some(&admin_user()), &deps)
        .await
        .unwrap();
    assert!(overview.items.is_empty());
}

#[tokio::test]
async fn add_title_unauthenticated_fails() {
    assert_unauthenticated(add_title("Nope", None, &deps()).await);
}

#[tokio::test]
async fn list_queue_requires_admin() {
    let deps = deps();
    assert_admin_required(list_queue(&QueueFilter::default(), Some(&reader_user()), &deps).await);
    assert_unauthenticated(list_queue(&QueueFilter::default(), None, &deps).await);
}

#[tokio::test]
async fn delete_item_as_non_admin_leaves_item_in_place() {
    let test_deps = TestDependencies::new();
    let queue = test_deps.queue.clone();
    let deps = test_deps.into_deps();
    let items = seed_titles(&deps, &["Keep me"]).await;

    assert_admin_required(delete_item(items[0].id, Some(&reader_user()), &deps).await);
    assert_unauthenticated(delete_item(items[0].id, None, &deps).await);
    assert_eq!(queue.items().len(), 1);
}

#[tokio::test]
async fn retry_item_requires_admin() {
    let deps = deps();
    let items = seed_titles(&deps, &["A"]).await;

    assert_admin_required(retry_item(items[0].id, Some(&reader_user()), &deps).await);
    assert_unauthenticated(retry_item(items[0].id, None, &deps).await);
}

#[tokio::test]
async fn force_generate_as_non_admin_does_not_call_the_generator() {
    let test_deps = TestDependencies::new();
    let generator = test_deps.generator.clone();
    let deps = test_deps.into_deps();
    let items = seed_titles(&deps, &["Expensive"]).await;

    assert_admin_required(force_generate(items[0].id, Some(&reader_user()), &deps).await);
    assert_unauthenticated(force_generate(items[0].id, None, &deps).await);
    assert_eq!(generator.call_count(), 0);
}

// ============================================================================
// Posts and taxonomy
// ============================================================================

#[tokio::test]
async fn post_actions_require_admin() {
    let deps = deps();

    assert_admin_required(list_posts(&PostFilter::default(), Some(&reader_user()), &deps).await);
    assert_unauthenticated(list_posts(&PostFilter::default(), None, &deps).await);
    assert_admin_required(
        edit_post(PostId::new(), PostEdit::default(), Some(&reader_user()), &deps).await,
    );
}

#[tokio::test]
async fn taxonomy_actions_require_admin() {
    let test_deps = TestDependencies::new();
    let term = test_deps
        .taxonomy
        .seed(TaxonomyKind::Tag, "rust", "rust");
    let deps = test_deps.into_deps();

    assert_admin_required(list_terms(TaxonomyKind::Tag, Some(&reader_user()), &deps).await);
    assert_admin_required(
        create_term(TaxonomyKind::Category, "New", Some(&reader_user()), &deps).await,
    );
    assert_unauthenticated(
        rename_term(TaxonomyKind::Tag, term.id, "Rust", None, &deps).await,
    );
}

// ============================================================================
// Admin email list
// ============================================================================

#[tokio::test]
async fn listed_email_is_admin_without_the_token_flag() {
    let deps = TestDependencies::new()
        .admin_emails(&["Owner@Example.com"])
        .into_deps();
    let owner = AuthUser {
        member_id: MemberId::new(),
        email: "owner@example.com".to_string(),
        is_admin: false,
    };

    let item = add_title("From the owner", Some(&owner), &deps).await.unwrap();
    assert_eq!(item.title, "From the owner");

    // Other non-admins are still rejected
    assert_admin_required(add_title("Nope", Some(&reader_user()), &deps).await);
}
