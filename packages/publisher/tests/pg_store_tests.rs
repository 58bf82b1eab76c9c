//! Postgres store behaviour: position assignment, conditional writes,
//! taxonomy links and publish timestamps.
//!
//! These start a Postgres container and are ignored by default:
//! cargo test -p publisher --test pg_store_tests -- --ignored

mod common;

use std::collections::HashSet;

use crate::common::TestHarness;
use publisher_core::domains::posts::models::{NewDraft, Post, PostFilter};
use publisher_core::domains::queue::actions::{generate_item, publish_item, PublishOutcome};
use publisher_core::domains::queue::models::{
    Promotion, QueueItem, QueueStatus, QueueTransition,
};
use publisher_core::domains::taxonomy::models::{TaxonomyKind, Term};
use test_context::test_context;
use uuid::Uuid;

fn unique(label: &str) -> String {
    format!("{} {}", label, Uuid::new_v4().simple())
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_inserts_never_share_a_position(ctx: &TestHarness) {
    let mut handles = Vec::new();
    for n in 0..8 {
        let pool = ctx.db_pool.clone();
        handles.push(tokio::spawn(async move {
            let titles = vec![unique(&format!("batch {} a", n)), unique(&format!("batch {} b", n))];
            QueueItem::insert_many(&titles, &pool).await
        }));
    }

    let mut positions = HashSet::new();
    for handle in handles {
        let batch = handle.await.unwrap().unwrap();
        assert_eq!(batch[1].position, batch[0].position + 1);
        for item in batch {
            assert!(positions.insert(item.position), "duplicate position {}", item.position);
        }
    }
    assert_eq!(positions.len(), 16);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn claim_is_a_compare_and_swap(ctx: &TestHarness) {
    let items = QueueItem::insert_many(&[unique("claim")], &ctx.db_pool)
        .await
        .unwrap();
    let id = items[0].id;
    let claimable = [QueueStatus::Pending, QueueStatus::Failed];

    let first = QueueItem::transition(id, &claimable, &QueueTransition::Claim, &ctx.db_pool)
        .await
        .unwrap();
    let second = QueueItem::transition(id, &claimable, &QueueTransition::Claim, &ctx.db_pool)
        .await
        .unwrap();

    assert_eq!(first.map(|i| i.status), Some(QueueStatus::Generating));
    assert!(second.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn failed_write_clears_the_post_link(ctx: &TestHarness) {
    let items = QueueItem::insert_many(&[unique("fail")], &ctx.db_pool)
        .await
        .unwrap();
    let id = items[0].id;

    QueueItem::transition(id, &[QueueStatus::Pending], &QueueTransition::Claim, &ctx.db_pool)
        .await
        .unwrap();
    let failed = QueueItem::transition(
        id,
        &[QueueStatus::Generating],
        &QueueTransition::Failed {
            error: "upstream 503".into(),
        },
        &ctx.db_pool,
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(failed.status, QueueStatus::Failed);
    assert_eq!(failed.error_msg.as_deref(), Some("upstream 503"));
    assert!(failed.post_id.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn generated_draft_is_linked_and_published_once(ctx: &TestHarness) {
    let title = unique("Pipeline Run");
    let items = QueueItem::insert_many(&[title.clone()], &ctx.db_pool)
        .await
        .unwrap();

    let generated = generate_item(items[0].id, &ctx.deps).await.unwrap();
    assert_eq!(generated.item.status, QueueStatus::Generated);
    assert!(!generated.post.published);
    assert_eq!(generated.post.category_ids.len(), 1);
    assert_eq!(generated.post.tag_ids.len(), 2);
    assert_eq!(ctx.generator.call_count(), 1);

    let PublishOutcome::Published { post, item } =
        publish_item(items[0].id, &ctx.deps).await.unwrap()
    else {
        panic!("expected a publish");
    };
    assert_eq!(item.status, QueueStatus::Published);
    assert!(post.published);

    // A second promotion writes nothing, so the first timestamp stays
    let again = QueueItem::promote(item.id, post.id, &ctx.db_pool).await.unwrap();
    assert!(matches!(again, Promotion::NotGenerated));
    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(stored.published_at, post.published_at);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn promotion_of_an_unlinked_item_rolls_back_the_post(ctx: &TestHarness) {
    let items = QueueItem::insert_many(&[unique("Linked"), unique("Unlinked")], &ctx.db_pool)
        .await
        .unwrap();
    let post = generate_item(items[0].id, &ctx.deps).await.unwrap().post;

    let outcome = QueueItem::promote(items[1].id, post.id, &ctx.db_pool)
        .await
        .unwrap();

    assert!(matches!(outcome, Promotion::NotGenerated));
    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    assert!(!stored.published);
    assert!(stored.published_at.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn draft_for_an_item_not_generating_is_rolled_back(ctx: &TestHarness) {
    let items = QueueItem::insert_many(&[unique("Not Claimed")], &ctx.db_pool)
        .await
        .unwrap();
    let slug = format!("not-claimed-{}", Uuid::new_v4().simple());
    let draft = NewDraft {
        title: items[0].title.clone(),
        slug: slug.clone(),
        description: "d".into(),
        content: "c".into(),
        excerpt: "e".into(),
        category_ids: Vec::new(),
        tag_ids: Vec::new(),
    };

    let linked = QueueItem::link_draft(items[0].id, &draft, &ctx.db_pool)
        .await
        .unwrap();

    assert!(linked.is_none());
    assert!(!Post::slug_exists(&slug, &ctx.db_pool).await.unwrap());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn term_create_on_taken_name_returns_existing_row(ctx: &TestHarness) {
    let name = unique("Category");
    let slug = format!("slug-{}", Uuid::new_v4().simple());

    let first = Term::create(TaxonomyKind::Category, &name, &slug, &ctx.db_pool)
        .await
        .unwrap();
    let second = Term::create(TaxonomyKind::Category, &name, "ignored-slug", &ctx.db_pool)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.slug, slug);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn post_list_filters_by_category(ctx: &TestHarness) {
    let items = QueueItem::insert_many(&[unique("Filtered")], &ctx.db_pool)
        .await
        .unwrap();
    let post = generate_item(items[0].id, &ctx.deps).await.unwrap().post;
    let category_id = post.category_ids[0];

    let filter = PostFilter::builder()
        .category_id(category_id)
        .published(false)
        .limit(500)
        .build();
    let posts = Post::list(&filter, &ctx.db_pool).await.unwrap();

    assert!(posts.iter().any(|p| p.id == post.id));
    assert!(posts.iter().all(|p| p.category_ids.contains(&category_id)));
}
