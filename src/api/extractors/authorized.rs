use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::services::auth::ClaimSet;

/// Verified claims of the caller, for handlers behind `middleware::auth::access::protect`.
///
/// The guard middleware inserts the `ClaimSet` into request extensions only
/// after the permission check passed. A missing entry means the route was
/// wired without a guard, so this answers 401 rather than running unguarded.
pub struct Authorized(pub ClaimSet);

impl<S> FromRequestParts<S> for Authorized
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ClaimSet>()
            .cloned()
            .map(Authorized)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
