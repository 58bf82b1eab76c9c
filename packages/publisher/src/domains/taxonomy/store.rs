use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{TaxonomyKind, Term};
use crate::common::utils::SlugProbe;
use crate::common::TermId;
use crate::kernel::BaseTaxonomyStore;

#[derive(Clone)]
pub struct PgTaxonomyStore {
    pool: PgPool,
}

impl PgTaxonomyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseTaxonomyStore for PgTaxonomyStore {
    async fn find_by_id(&self, kind: TaxonomyKind, id: TermId) -> Result<Option<Term>> {
        Term::find_by_id(kind, id, &self.pool).await
    }

    async fn find_by_name(&self, kind: TaxonomyKind, name: &str) -> Result<Option<Term>> {
        Term::find_by_name(kind, name, &self.pool).await
    }

    async fn slug_exists(&self, kind: TaxonomyKind, slug: &str) -> Result<bool> {
        Term::slug_exists(kind, slug, &self.pool).await
    }

    async fn names(&self, kind: TaxonomyKind) -> Result<Vec<String>> {
        Term::names(kind, &self.pool).await
    }

    async fn list(&self, kind: TaxonomyKind) -> Result<Vec<Term>> {
        Term::find_all(kind, &self.pool).await
    }

    async fn create(&self, kind: TaxonomyKind, name: &str, slug: &str) -> Result<Term> {
        Term::create(kind, name, slug, &self.pool).await
    }

    async fn update(
        &self,
        kind: TaxonomyKind,
        id: TermId,
        name: &str,
        slug: &str,
    ) -> Result<Option<Term>> {
        Term::update(kind, id, name, slug, &self.pool).await
    }
}

/// Slug collision check scoped to one taxonomy kind
pub struct TermSlugs<'a> {
    pub store: &'a dyn BaseTaxonomyStore,
    pub kind: TaxonomyKind,
}

#[async_trait]
impl SlugProbe for TermSlugs<'_> {
    async fn exists(&self, candidate: &str) -> Result<bool> {
        self.store.slug_exists(self.kind, candidate).await
    }
}
