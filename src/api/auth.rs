//! Caller identity extraction.
//!
//! Authentication happens upstream; the verified user id arrives in the
//! `X-User-Id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::types::UserId;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthenticated("missing user identity"))?;

        parse_user_id(raw.to_str().unwrap_or_default())
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthenticated("invalid user identity"))
    }
}

fn parse_user_id(raw: &str) -> Option<UserId> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Some(UserId(id)),
        _ => None,
    }
}
