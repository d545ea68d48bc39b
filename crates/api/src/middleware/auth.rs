//! Bearer-token authentication extractors.
//!
//! The token is resolved through [`domain::AuthService::authenticate`], which
//! re-loads the user on every request.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use domain::{DomainError, Principal};
use store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor that requires a valid access token.
///
/// ```rust,ignore
/// async fn handler(AuthUser(principal): AuthUser) -> String {
///     principal.email
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

/// Extractor that requires a valid access token belonging to an admin.
///
/// Rejects with 401 when the token is missing or invalid, and 403 when the
/// caller is not an admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

fn bearer_token(parts: &Parts) -> Result<&str, DomainError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| DomainError::Unauthenticated("missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| DomainError::Unauthenticated("malformed Authorization header".to_string()))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| DomainError::Unauthenticated("expected a bearer token".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(DomainError::Unauthenticated(
            "expected a bearer token".to_string(),
        ));
    }

    Ok(token.trim())
}

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let principal = state.auth.authenticate(token).await?;
        Ok(Self(principal))
    }
}

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_admin {
            return Err(DomainError::Forbidden("admin privileges required".to_string()).into());
        }
        Ok(Self(principal))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/profile");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))).unwrap(), "abc.def");
        assert_eq!(bearer_token(&parts(Some("bearer xyz"))).unwrap(), "xyz");
    }

    #[test]
    fn rejects_missing_or_foreign_scheme() {
        assert!(bearer_token(&parts(None)).is_err());
        assert!(bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))).is_err());
        assert!(bearer_token(&parts(Some("Bearer "))).is_err());
        assert!(bearer_token(&parts(Some("token-without-scheme"))).is_err());
    }
}
