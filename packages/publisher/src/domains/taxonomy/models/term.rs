use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::TermId;

/// Category or tag. Both live in their own table with the same shape.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Category,
    Tag,
}

impl TaxonomyKind {
    fn table(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Tag => "tags",
        }
    }

    /// Slug used when a name has no retainable characters
    pub fn fallback_slug(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::Tag => "tag",
        }
    }
}

impl std::fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxonomyKind::Category => write!(f, "category"),
            TaxonomyKind::Tag => write!(f, "tag"),
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Term {
    pub async fn find_by_id(kind: TaxonomyKind, id: TermId, pool: &PgPool) -> Result<Option<Self>> {
        let term = sqlx::query_as::<_, Term>(&format!(
            "SELECT * FROM {} WHERE id = $1",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(term)
    }

    /// Exact-name lookup
    pub async fn find_by_name(kind: TaxonomyKind, name: &str, pool: &PgPool) -> Result<Option<Self>> {
        let term = sqlx::query_as::<_, Term>(&format!(
            "SELECT * FROM {} WHERE name = $1",
            kind.table()
        ))
        .bind(name)
        .fetch_optional(pool)
        .await?;
        Ok(term)
    }

    pub async fn slug_exists(kind: TaxonomyKind, slug: &str, pool: &PgPool) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE slug = $1)",
            kind.table()
        ))
        .bind(slug)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn names(kind: TaxonomyKind, pool: &PgPool) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT name FROM {} ORDER BY name ASC",
            kind.table()
        ))
        .fetch_all(pool)
        .await?;
        Ok(names)
    }

    pub async fn find_all(kind: TaxonomyKind, pool: &PgPool) -> Result<Vec<Self>> {
        let terms = sqlx::query_as::<_, Term>(&format!(
            "SELECT * FROM {} ORDER BY name ASC",
            kind.table()
        ))
        .fetch_all(pool)
        .await?;
        Ok(terms)
    }

    /// Insert, or return the row another writer created under the same name.
    pub async fn create(kind: TaxonomyKind, name: &str, slug: &str, pool: &PgPool) -> Result<Self> {
        let inserted = sqlx::query_as::<_, Term>(&format!(
            "INSERT INTO {} (id, name, slug) VALUES ($1, $2, $3)
             ON CONFLICT (name) DO NOTHING
             RETURNING *",
            kind.table()
        ))
        .bind(TermId::new())
        .bind(name)
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        match inserted {
            Some(term) => Ok(term),
            None => Self::find_by_name(kind, name, pool)
                .await?
                .ok_or_else(|| anyhow::anyhow!("{} '{}' vanished after conflict", kind, name)),
        }
    }

    pub async fn update(
        kind: TaxonomyKind,
        id: TermId,
        name: &str,
        slug: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let term = sqlx::query_as::<_, Term>(&format!(
            "UPDATE {} SET name = $1, slug = $2 WHERE id = $3 RETURNING *",
            kind.table()
        ))
        .bind(name)
        .bind(slug)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(term)
    }
}
