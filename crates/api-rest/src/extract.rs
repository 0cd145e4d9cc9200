//! Request extractors.
//!
//! [`Bearer`] and [`MaybeBearer`] only capture the credential. Resolving it to an actor needs the
//! database, so it happens inside the handler's blocking section on the same connection as the
//! operation. A gated handler takes [`Bearer`] ahead of its body extractor, so a request with no
//! credential is refused before the body is read.

use crate::error::ApiError;
use api_shared::auth::bearer_token;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use multicare_core::access::{authenticate, Actor};
use multicare_core::{Connection, CoreError, CoreResult};

fn token_from(parts: &Parts) -> Result<Option<String>, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());
    Ok(bearer_token(header)?.map(str::to_owned))
}

/// Bearer token that must be present. A missing one is rejected with 401.
#[derive(Debug, Clone)]
pub struct Bearer(pub String);

impl Bearer {
    /// Resolves the token; an unknown or expired token is `Unauthenticated`.
    pub fn actor(&self, conn: &Connection) -> CoreResult<Actor> {
        authenticate(conn, Some(&self.0))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        token_from(parts)?
            .map(Bearer)
            .ok_or_else(|| CoreError::Unauthenticated("Not authenticated".into()).into())
    }
}

/// Bearer token on routes that also serve anonymous callers.
#[derive(Debug, Clone, Default)]
pub struct MaybeBearer(pub Option<String>);

impl MaybeBearer {
    /// Resolves the token when present. A token that was sent but does not verify is still an
    /// error.
    pub fn actor(&self, conn: &Connection) -> CoreResult<Option<Actor>> {
        match &self.0 {
            Some(token) => authenticate(conn, Some(token)).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeBearer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeBearer(token_from(parts)?))
    }
}

/// `Json` whose rejection uses the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `Query` whose rejection uses the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// `Form` whose rejection uses the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct AppForm<T>(pub T);
