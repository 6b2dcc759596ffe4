//! Acting user extractor.
//!
//! Reads the caller's identity from the `X-User-Id` header. There is no
//! authentication; a missing header acts as `anonymous`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use flexflow_types::id::UserId;

use crate::http::error::AppError;

pub const USER_HEADER: &str = "x-user-id";
pub const ANONYMOUS: &str = "anonymous";

/// The user on whose behalf the request acts.
pub struct ActingUser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for ActingUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_HEADER) else {
            return Ok(ActingUser(UserId::new(ANONYMOUS)));
        };

        let user = value
            .to_str()
            .map_err(|_| AppError::Validation("Invalid X-User-Id header encoding".to_string()))?
            .trim();

        if user.is_empty() {
            return Ok(ActingUser(UserId::new(ANONYMOUS)));
        }
        Ok(ActingUser(UserId::new(user)))
    }
}
