//! Admin category and tag API. Both kinds share the handlers below.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::caller;
use crate::common::{AuthUser, TermId};
use crate::domains::taxonomy::actions;
use crate::domains::taxonomy::{TaxonomyKind, Term};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct TermName {
    pub name: String,
}

async fn list(
    kind: TaxonomyKind,
    state: AppState,
    user: Option<Extension<AuthUser>>,
) -> Result<Json<Vec<Term>>, ApiError> {
    Ok(Json(actions::list_terms(kind, caller(&user), &state.deps).await?))
}

async fn create(
    kind: TaxonomyKind,
    state: AppState,
    user: Option<Extension<AuthUser>>,
    name: &str,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    let term = actions::create_term(kind, name, caller(&user), &state.deps).await?;
    Ok((StatusCode::CREATED, Json(term)))
}

async fn rename(
    kind: TaxonomyKind,
    state: AppState,
    user: Option<Extension<AuthUser>>,
    id: TermId,
    name: &str,
) -> Result<Json<Term>, ApiError> {
    Ok(Json(
        actions::rename_term(kind, id, name, caller(&user), &state.deps).await?,
    ))
}

pub async fn list_categories(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
) -> Result<Json<Vec<Term>>, ApiError> {
    list(TaxonomyKind::Category, state, user).await
}

pub async fn create_category(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(body): Json<TermName>,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    create(TaxonomyKind::Category, state, user, &body.name).await
}

pub async fn rename_category(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<TermId>,
    Json(body): Json<TermName>,
) -> Result<Json<Term>, ApiError> {
    rename(TaxonomyKind::Category, state, user, id, &body.name).await
}

pub async fn list_tags(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
) -> Result<Json<Vec<Term>>, ApiError> {
    list(TaxonomyKind::Tag, state, user).await
}

pub async fn create_tag(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(body): Json<TermName>,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    create(TaxonomyKind::Tag, state, user, &body.name).await
}

pub async fn rename_tag(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<TermId>,
    Json(body): Json<TermName>,
) -> Result<Json<Term>, ApiError> {
    rename(TaxonomyKind::Tag, state, user, id, &body.name).await
}
