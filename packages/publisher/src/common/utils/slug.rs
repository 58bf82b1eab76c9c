//! Slug derivation and collision resolution.
//!
//! Every slug in the system (posts, categories, tags) goes through
//! [`slugify`] and [`resolve_unique`] so collision handling is identical
//! everywhere.

use async_trait::async_trait;
use thiserror::Error;

/// Candidates probed before giving up (`base`, `base-1`, ... `base-99`).
pub const MAX_SLUG_PROBES: usize = 100;

#[derive(Error, Debug)]
pub enum SlugError {
    #[error("no free slug for '{base}' after {attempts} attempts")]
    Exhausted { base: String, attempts: usize },

    #[error("slug existence check failed: {0}")]
    Probe(#[source] anyhow::Error),
}

/// Existence check scoped to one entity type.
#[async_trait]
pub trait SlugProbe: Send + Sync {
    async fn exists(&self, candidate: &str) -> anyhow::Result<bool>;
}

/// Derive a URL-safe slug from free text.
///
/// Lowercases and trims, drops anything that is not an ASCII letter, digit,
/// whitespace, hyphen or underscore, and collapses runs of
/// whitespace/underscore/hyphen into a single hyphen. Never starts or ends
/// with a hyphen. Input with nothing retainable yields an empty string.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut separator = false;

    for c in text.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if separator && !slug.is_empty() {
                slug.push('-');
            }
            separator = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            separator = true;
        }
        // other characters are removed without splitting the word
    }

    slug
}

/// Find the first free slug among `base`, `base-1`, `base-2`, ...
///
/// `existing` is the entity's current slug on update: when it already equals
/// `base` nothing is probed. Without a probe there is nothing to collide with
/// and `base` is returned as-is.
pub async fn resolve_unique(
    base: &str,
    existing: Option<&str>,
    probe: Option<&dyn SlugProbe>,
) -> Result<String, SlugError> {
    if existing == Some(base) {
        return Ok(base.to_string());
    }

    let Some(probe) = probe else {
        return Ok(base.to_string());
    };

    for attempt in 0..MAX_SLUG_PROBES {
        let candidate = if attempt == 0 {
            base.to_string()
        } else {
            format!("{}-{}", base, attempt)
        };

        if !probe.exists(&candidate).await.map_err(SlugError::Probe)? {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted {
        base: base.to_string(),
        attempts: MAX_SLUG_PROBES,
    })
}
