//! Admin create/rename for categories and tags.

use tracing::info;

use super::models::{TaxonomyKind, Term};
use super::resolver::term_slug;
use crate::common::auth::{Actor, AdminCapability, AuthUser};
use crate::common::{PipelineError, TermId};
use crate::kernel::ServerDeps;

pub async fn list_terms(
    kind: TaxonomyKind,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Vec<Term>, PipelineError> {
    Actor::from_caller(caller)?
        .can(AdminCapability::ManageTaxonomy)
        .check(deps)
        .await?;

    Ok(deps.taxonomy.list(kind).await?)
}

/// Create a category or tag. An existing term with the same name is returned as-is.
pub async fn create_term(
    kind: TaxonomyKind,
    name: &str,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Term, PipelineError> {
    Actor::from_caller(caller)?
        .can(AdminCapability::ManageTaxonomy)
        .check(deps)
        .await?;

    let name = name.trim();
    if name.is_empty() {
        return Err(PipelineError::InvalidInput(format!("{} name is required", kind)));
    }

    if let Some(existing) = deps.taxonomy.find_by_name(kind, name).await? {
        return Ok(existing);
    }

    let slug = term_slug(deps.taxonomy.as_ref(), kind, name, None).await?;
    let term = deps.taxonomy.create(kind, name, &slug).await?;

    info!(kind = %kind, term_id = %term.id, slug = %term.slug, "Taxonomy term created");
    Ok(term)
}

/// Rename a term. The slug is re-derived from the new name; if it comes out
/// the same as the current slug it is kept without a collision check.
pub async fn rename_term(
    kind: TaxonomyKind,
    id: TermId,
    name: &str,
    caller: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Term, PipelineError> {
    Actor::from_caller(caller)?
        .can(AdminCapability::ManageTaxonomy)
        .check(deps)
        .await?;

    let name = name.trim();
    if name.is_empty() {
        return Err(PipelineError::InvalidInput(format!("{} name is required", kind)));
    }

    let current = deps
        .taxonomy
        .find_by_id(kind, id)
        .await?
        .ok_or_else(|| PipelineError::not_found(entity(kind), id))?;

    if let Some(other) = deps.taxonomy.find_by_name(kind, name).await? {
        if other.id != id {
            return Err(PipelineError::InvalidInput(format!(
                "{} '{}' already exists",
                kind, name
            )));
        }
    }

    let slug = term_slug(deps.taxonomy.as_ref(), kind, name, Some(&current.slug)).await?;
    let term = deps
        .taxonomy
        .update(kind, id, name, &slug)
        .await?
        .ok_or_else(|| PipelineError::not_found(entity(kind), id))?;

    info!(kind = %kind, term_id = %id, slug = %term.slug, "Taxonomy term renamed");
    Ok(term)
}

fn entity(kind: TaxonomyKind) -> &'static str {
    match kind {
        TaxonomyKind::Category => "category",
        TaxonomyKind::Tag => "tag",
    }
}
