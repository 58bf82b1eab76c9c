// TestDependencies - mock implementations for testing
//
// Provides in-memory stores and scripted services that can be injected into
// ServerDeps for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use super::rate_limit::InMemoryRateLimitStore;
use super::{
    BaseAlertNotifier, BaseContentGenerator, BasePostStore, BaseQueueStore, BaseTaxonomyStore,
    GeneratedPost, GenerationRequest, ServerDeps,
};
use crate::common::{PostId, QueueItemId, TermId};
use crate::domains::posts::models::{NewDraft, Post, PostFilter};
use crate::domains::queue::models::{
    Promotion, QueueFilter, QueueItem, QueueItemEdit, QueueStatus, QueueTransition, StatusCounts,
};
use crate::domains::taxonomy::models::{TaxonomyKind, Term};

// =============================================================================
// In-memory Queue Store
// =============================================================================

/// Queue rows plus a handle on the post store, so draft linking and
/// promotion change both under one lock like the Postgres transaction does.
pub struct InMemoryQueueStore {
    items: Mutex<Vec<QueueItem>>,
    posts: Arc<InMemoryPostStore>,
    failing_target: Mutex<Option<QueueStatus>>,
}

impl InMemoryQueueStore {
    pub fn new(posts: Arc<InMemoryPostStore>) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            posts,
            failing_target: Mutex::new(None),
        }
    }

    /// Make every write into `status` error until cleared
    pub fn fail_writes_to(&self, status: QueueStatus) {
        *self.failing_target.lock().unwrap() = Some(status);
    }

    pub fn clear_write_failures(&self) {
        *self.failing_target.lock().unwrap() = None;
    }

    fn check_write(&self, target: QueueStatus) -> Result<()> {
        if *self.failing_target.lock().unwrap() == Some(target) {
            anyhow::bail!("queue store rejected write to {}", target);
        }
        Ok(())
    }

    /// Snapshot of every item, in queue order
    pub fn items(&self) -> Vec<QueueItem> {
        let mut items = self.items.lock().unwrap().clone();
        sort_queue(&mut items);
        items
    }

    /// Overwrite a stored item (for arranging states tests cannot reach directly)
    pub fn put(&self, item: QueueItem) {
        let mut items = self.items.lock().unwrap();
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
    }
}

fn sort_queue(items: &mut [QueueItem]) {
    items.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then(a.created_at.cmp(&b.created_at))
    });
}

#[async_trait]
impl BaseQueueStore for InMemoryQueueStore {
    async fn insert_titles(&self, titles: &[String]) -> Result<Vec<QueueItem>> {
        let mut items = self.items.lock().unwrap();
        let mut next = items.iter().map(|i| i.position).max().unwrap_or(0);

        let mut created = Vec::with_capacity(titles.len());
        for title in titles {
            next += 1;
            let now = Utc::now();
            let item = QueueItem {
                id: QueueItemId::new(),
                title: title.clone(),
                position: next,
                status: QueueStatus::Pending,
                post_id: None,
                error_msg: None,
                created_at: now,
                updated_at: now,
            };
            items.push(item.clone());
            created.push(item);
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: QueueItemId) -> Result<Option<QueueItem>> {
        Ok(self.items.lock().unwrap().iter().find(|i| i.id == id).cloned())
    }

    async fn find_oldest_by_status(&self, status: QueueStatus) -> Result<Option<QueueItem>> {
        Ok(self
            .items()
            .into_iter()
            .find(|i| i.status == status))
    }

    async fn count_by_status(&self, status: QueueStatus) -> Result<i64> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.status == status)
            .count() as i64)
    }

    async fn titles_by_status(&self, status: QueueStatus) -> Result<Vec<String>> {
        Ok(self
            .items()
            .into_iter()
            .filter(|i| i.status == status)
            .map(|i| i.title)
            .collect())
    }

    async fn transition(
        &self,
        id: QueueItemId,
        from: &[QueueStatus],
        transition: &QueueTransition,
    ) -> Result<Option<QueueItem>> {
        let mut items = self.items.lock().unwrap();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if !from.contains(&item.status) {
            return Ok(None);
        }
        self.check_write(transition.target())?;
        transition.apply(item);
        Ok(Some(item.clone()))
    }

    async fn link_draft(
        &self,
        id: QueueItemId,
        draft: &NewDraft,
    ) -> Result<Option<(QueueItem, Post)>> {
        let mut items = self.items.lock().unwrap();
        let Some(item) = items
            .iter_mut()
            .find(|i| i.id == id && i.status == QueueStatus::Generating)
        else {
            return Ok(None);
        };
        self.check_write(QueueStatus::Generated)?;

        let mut posts = self.posts.posts.lock().unwrap();
        let post = insert_draft(&mut posts, draft)?;
        QueueTransition::Generated { post_id: post.id }.apply(item);
        Ok(Some((item.clone(), post)))
    }

    async fn promote(&self, id: QueueItemId, post_id: PostId) -> Result<Promotion> {
        let mut items = self.items.lock().unwrap();
        let Some(item) = items.iter_mut().find(|i| {
            i.id == id && i.status == QueueStatus::Generated && i.post_id == Some(post_id)
        }) else {
            return Ok(Promotion::NotGenerated);
        };

        let mut posts = self.posts.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == post_id) else {
            return Ok(Promotion::PostMissing);
        };
        self.check_write(QueueStatus::Published)?;

        post.published = true;
        post.published_at.get_or_insert_with(Utc::now);
        post.updated_at = Utc::now();
        QueueTransition::Published.apply(item);
        Ok(Promotion::Published {
            item: item.clone(),
            post: post.clone(),
        })
    }

    async fn update_details(
        &self,
        id: QueueItemId,
        edit: &QueueItemEdit,
    ) -> Result<Option<QueueItem>> {
        let mut items = self.items.lock().unwrap();
        let Some(item) = items
            .iter_mut()
            .find(|i| i.id == id && i.status.is_editable())
        else {
            return Ok(None);
        };
        if let Some(title) = &edit.title {
            item.title = title.clone();
        }
        if let Some(position) = edit.position {
            item.position = position;
        }
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn delete_editable(&self, id: QueueItemId) -> Result<bool> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| !(i.id == id && i.status.is_editable()));
        Ok(items.len() < before)
    }

    async fn list(&self, filter: &QueueFilter) -> Result<Vec<QueueItem>> {
        Ok(self
            .items()
            .into_iter()
            .filter(|i| filter.matches(i))
            .collect())
    }

    async fn status_counts(&self) -> Result<StatusCounts> {
        let mut counts = StatusCounts::default();
        for item in self.items.lock().unwrap().iter() {
            counts.add(item.status, 1);
        }
        Ok(counts)
    }
}

// =============================================================================
// In-memory Post Store
// =============================================================================

#[derive(Default)]
pub struct InMemoryPostStore {
    posts: Mutex<Vec<Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    /// Remove a post (simulates a record deleted outside the pipeline)
    pub fn remove(&self, id: PostId) {
        self.posts.lock().unwrap().retain(|p| p.id != id);
    }
}

fn insert_draft(posts: &mut Vec<Post>, draft: &NewDraft) -> Result<Post> {
    if posts.iter().any(|p| p.slug == draft.slug) {
        anyhow::bail!("duplicate post slug '{}'", draft.slug);
    }

    let now = Utc::now();
    let post = Post {
        id: PostId::new(),
        title: draft.title.clone(),
        slug: draft.slug.clone(),
        description: draft.description.clone(),
        content: draft.content.clone(),
        excerpt: draft.excerpt.clone(),
        published: false,
        published_at: None,
        category_ids: draft.category_ids.clone(),
        tag_ids: draft.tag_ids.clone(),
        created_at: now,
        updated_at: now,
    };
    posts.push(post.clone());
    Ok(post)
}

#[async_trait]
impl BasePostStore for InMemoryPostStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.posts.lock().unwrap().iter().any(|p| p.slug == slug))
    }

    async fn update_title_slug(&self, id: PostId, title: &str, slug: &str) -> Result<Option<Post>> {
        let mut posts = self.posts.lock().unwrap();
        if posts.iter().any(|p| p.id != id && p.slug == slug) {
            anyhow::bail!("duplicate post slug '{}'", slug);
        }
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = title.to_string();
        post.slug = slug.to_string();
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }
}

// =============================================================================
// In-memory Taxonomy Store
// =============================================================================

#[derive(Default)]
pub struct InMemoryTaxonomyStore {
    categories: Mutex<Vec<Term>>,
    tags: Mutex<Vec<Term>>,
    creates: Mutex<usize>,
}

impl InMemoryTaxonomyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn terms(&self, kind: TaxonomyKind) -> &Mutex<Vec<Term>> {
        match kind {
            TaxonomyKind::Category => &self.categories,
            TaxonomyKind::Tag => &self.tags,
        }
    }

    pub fn all(&self, kind: TaxonomyKind) -> Vec<Term> {
        self.terms(kind).lock().unwrap().clone()
    }

    /// Seed a term with a fixed slug
    pub fn seed(&self, kind: TaxonomyKind, name: &str, slug: &str) -> Term {
        let term = Term {
            id: TermId::new(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: Utc::now(),
        };
        self.terms(kind).lock().unwrap().push(term.clone());
        term
    }

    /// Number of create calls that inserted a row
    pub fn create_count(&self) -> usize {
        *self.creates.lock().unwrap()
    }
}

#[async_trait]
impl BaseTaxonomyStore for InMemoryTaxonomyStore {
    async fn find_by_id(&self, kind: TaxonomyKind, id: TermId) -> Result<Option<Term>> {
        Ok(self
            .terms(kind)
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn find_by_name(&self, kind: TaxonomyKind, name: &str) -> Result<Option<Term>> {
        Ok(self
            .terms(kind)
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn slug_exists(&self, kind: TaxonomyKind, slug: &str) -> Result<bool> {
        Ok(self
            .terms(kind)
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.slug == slug))
    }

    async fn names(&self, kind: TaxonomyKind) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .terms(kind)
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn list(&self, kind: TaxonomyKind) -> Result<Vec<Term>> {
        let mut terms = self.all(kind);
        terms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(terms)
    }

    async fn create(&self, kind: TaxonomyKind, name: &str, slug: &str) -> Result<Term> {
        let mut terms = self.terms(kind).lock().unwrap();
        if let Some(existing) = terms.iter().find(|t| t.name == name) {
            return Ok(existing.clone());
        }
        if terms.iter().any(|t| t.slug == slug) {
            anyhow::bail!("duplicate {} slug '{}'", kind, slug);
        }

        let term = Term {
            id: TermId::new(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: Utc::now(),
        };
        terms.push(term.clone());
        *self.creates.lock().unwrap() += 1;
        Ok(term)
    }

    async fn update(
        &self,
        kind: TaxonomyKind,
        id: TermId,
        name: &str,
        slug: &str,
    ) -> Result<Option<Term>> {
        let mut terms = self.terms(kind).lock().unwrap();
        let Some(term) = terms.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        term.name = name.to_string();
        term.slug = slug.to_string();
        Ok(Some(term.clone()))
    }
}

// =============================================================================
// Mock Content Generator
// =============================================================================

pub struct MockGenerator {
    responses: Arc<Mutex<VecDeque<Result<GeneratedPost, String>>>>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
    delay: Option<Duration>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Queue a successful response
    pub fn with_post(self, post: GeneratedPost) -> Self {
        self.responses.lock().unwrap().push_back(Ok(post));
        self
    }

    /// Queue a failure with the given message
    pub fn with_error(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Sleep before answering (lets overlapping calls interleave)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all generation requests that were made
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete response for `title`
pub fn sample_post(title: &str) -> GeneratedPost {
    GeneratedPost {
        description: format!("About {}", title),
        content: format!("# {}\n\nBody text.", title),
        excerpt: format!("A short look at {}", title),
        categories: vec!["Engineering".to_string()],
        tags: vec!["rust".to_string(), "postgres".to_string()],
    }
}

#[async_trait]
impl BaseContentGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedPost> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(post)) => Ok(post),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(sample_post(&request.title)),
        }
    }
}

// =============================================================================
// Recording Notifier
// =============================================================================

pub struct RecordingNotifier {
    alerts: Arc<Mutex<Vec<Vec<String>>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            alerts: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// Every send records the titles, then errors
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Titles of every alert sent, oldest first
    pub fn alerts(&self) -> Vec<Vec<String>> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAlertNotifier for RecordingNotifier {
    async fn send_low_queue_alert(&self, titles: &[String]) -> Result<()> {
        self.alerts.lock().unwrap().push(titles.to_vec());
        if self.fail {
            anyhow::bail!("mail relay unavailable");
        }
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub queue: Arc<InMemoryQueueStore>,
    pub posts: Arc<InMemoryPostStore>,
    pub taxonomy: Arc<InMemoryTaxonomyStore>,
    pub generator: Arc<MockGenerator>,
    pub notifier: Arc<RecordingNotifier>,
    pub rate_limits: Arc<InMemoryRateLimitStore>,
    pub admin_emails: Vec<String>,
}

impl TestDependencies {
    pub fn new() -> Self {
        let posts = Arc::new(InMemoryPostStore::new());
        Self {
            queue: Arc::new(InMemoryQueueStore::new(posts.clone())),
            posts,
            taxonomy: Arc::new(InMemoryTaxonomyStore::new()),
            generator: Arc::new(MockGenerator::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            rate_limits: Arc::new(InMemoryRateLimitStore::new()),
            admin_emails: Vec::new(),
        }
    }

    /// Set a mock generator
    pub fn mock_generator(mut self, generator: MockGenerator) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    /// Set a recording notifier
    pub fn mock_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Grant admin to these emails regardless of the token flag
    pub fn admin_emails(mut self, emails: &[&str]) -> Self {
        self.admin_emails = emails.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Convert into ServerDeps for testing
    pub fn into_deps(self) -> Arc<ServerDeps> {
        Arc::new(ServerDeps::new(
            self.queue,
            self.posts,
            self.taxonomy,
            self.generator,
            self.notifier,
            self.rate_limits,
            self.admin_emails,
        ))
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
