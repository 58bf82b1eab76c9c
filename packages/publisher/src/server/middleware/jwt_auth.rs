use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::common::AuthUser;
use crate::domains::auth::JwtService;
use crate::server::app::AppState;

/// Attach the verified caller to the request as an [`AuthUser`].
///
/// A missing or bad token is not rejected here: the request continues
/// anonymous and the admin actions refuse it with 401. Whether the caller is
/// an admin is decided later from both the claim and `ADMIN_EMAILS`.
pub async fn jwt_auth_middleware(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match caller_from_headers(request.headers(), &state.jwt_service) {
        Some(user) => {
            debug!(member_id = %user.member_id, is_admin = user.is_admin, "Caller authenticated");
            request.extensions_mut().insert(user);
        }
        None => debug!("Request carries no valid bearer token"),
    }

    next.run(request).await
}

/// `Authorization: Bearer <jwt>`; the scheme name is case-insensitive.
fn caller_from_headers(headers: &HeaderMap, jwt: &JwtService) -> Option<AuthUser> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    jwt.verify_token(token.trim()).ok().map(AuthUser::from)
}
