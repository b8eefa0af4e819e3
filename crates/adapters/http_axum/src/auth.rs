//! Caller identification.

use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;

use careops_app::ports::{Credentials, Notifier, Store};
use careops_domain::error::AuthError;
use careops_domain::permission::Principal;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller of a request.
///
/// The token is read from an `Authorization: Bearer` header, or from a
/// `token` query parameter when no header is present.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim().to_string())
}

fn query_token(parts: &Parts) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.token)
}

impl<S, N, C> FromRequestParts<AppState<S, N, C>> for Authenticated
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, N, C>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| query_token(parts))
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let principal = state.auth_service.authenticate(&token).await?;
        Ok(Self(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn should_read_bearer_header() {
        let parts = parts("/api/auth/me", Some("Bearer abc.def"));
        assert_eq!(bearer_token(&parts).as_deref(), Some("abc.def"));
    }

    #[test]
    fn should_ignore_other_schemes() {
        let parts = parts("/api/auth/me", Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn should_fall_back_to_query_parameter() {
        let parts = parts("/api/auth/me?token=abc&email=x%40y.z", None);
        assert_eq!(bearer_token(&parts), None);
        assert_eq!(query_token(&parts).as_deref(), Some("abc"));
    }
}
