//! Authentication extractors.
//!
//! Requests authenticate with `Authorization: Bearer <jwt>`. The token is
//! verified, checked against the blacklist, and resolved to a fresh user row
//! once per request; later extractors in the same request reuse the result.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(current): RequireAuth) -> Json<User> {
///     Json(current.user)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a valid bearer token for an admin account.
pub struct RequireAdmin(pub CurrentUser);

/// Extractor that resolves the caller if a valid token is present.
///
/// A missing or invalid token yields `None` rather than rejecting.
pub struct OptionalAuth(pub Option<CurrentUser>);

/// Pull the token out of an `Authorization: Bearer ...` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn authenticate(parts: &mut Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    if let Some(current) = parts.extensions.get::<CurrentUser>() {
        return Ok(current.clone());
    }

    let token = bearer_token(parts)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;
    let current = state.auth().authenticate(token).await?;

    set_sentry_user(&current.id(), Some(current.user.email.as_str()));
    tracing::Span::current().record("user_id", current.id().as_i32());
    parts.extensions.insert(current.clone());
    Ok(current)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = authenticate(parts, state).await?;
        if !current.is_admin() {
            return Err(AppError::Forbidden("Not authorized as an admin".to_string()));
        }
        Ok(Self(current))
    }
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() {
            return Ok(Self(None));
        }
        match authenticate(parts, state).await {
            Ok(current) => Ok(Self(Some(current))),
            Err(AppError::Auth(
                AuthError::InvalidToken | AuthError::TokenRevoked | AuthError::UserNotFound,
            )) => Ok(Self(None)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/users/profile");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
