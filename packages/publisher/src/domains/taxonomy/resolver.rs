//! Find-or-create for category/tag names returned by the generator.

use std::collections::HashMap;

use tracing::debug;

use super::models::TaxonomyKind;
use super::store::TermSlugs;
use crate::common::utils::{resolve_unique, slugify};
use crate::common::{PipelineError, TermId};
use crate::kernel::BaseTaxonomyStore;

/// Resolve `names` to term ids, creating missing terms with a unique slug.
///
/// Names are trimmed and blank ones are skipped, so the result can be
/// shorter than `names`. Matching is exact after trimming: "Rust" and
/// "rust" are different terms. A name repeated within one call resolves to
/// the same id without a second lookup; the caller drops the duplicates.
pub async fn resolve_terms(
    store: &dyn BaseTaxonomyStore,
    kind: TaxonomyKind,
    names: &[String],
) -> Result<Vec<TermId>, PipelineError> {
    let mut memo: HashMap<&str, TermId> = HashMap::new();
    let mut ids = Vec::with_capacity(names.len());

    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        if let Some(id) = memo.get(name) {
            ids.push(*id);
            continue;
        }

        let id = match store.find_by_name(kind, name).await? {
            Some(term) => term.id,
            None => {
                let slug = term_slug(store, kind, name, None).await?;
                let term = store.create(kind, name, &slug).await?;
                debug!(kind = %kind, name = %name, slug = %term.slug, "Created taxonomy term");
                term.id
            }
        };

        memo.insert(name, id);
        ids.push(id);
    }

    Ok(ids)
}

/// Unique slug for a term name, scoped to `kind`.
pub(crate) async fn term_slug(
    store: &dyn BaseTaxonomyStore,
    kind: TaxonomyKind,
    name: &str,
    existing: Option<&str>,
) -> Result<String, PipelineError> {
    let mut base = slugify(name);
    if base.is_empty() {
        base = kind.fallback_slug().to_string();
    }

    let probe = TermSlugs { store, kind };
    Ok(resolve_unique(&base, existing, Some(&probe)).await?)
}
