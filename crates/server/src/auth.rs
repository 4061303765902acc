//! Caller identity.
//!
//! Authentication itself happens upstream; a trusted proxy forwards the
//! resolved user id in the `x-user-id` header. The extractor only checks
//! that the header is present and non-empty.

use axum::{extract::FromRequestParts, http::request::Parts};

use prep_core::model::UserId;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, extracted from the proxy-set header.
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|id| !id.is_empty())
            .map(|id| AuthUser(UserId::from(id)))
            .ok_or(ApiError::Unauthorized)
    }
}
