//! Actor extraction.
//!
//! Authentication happens upstream. By the time a request reaches this
//! router the authenticated user's id is in the [`ACTOR_HEADER`] header.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use accolade_core::directory::Actor;

use crate::error::ApiError;

pub const ACTOR_HEADER: &str = "x-actor-id";

/// The caller of the current request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(ACTOR_HEADER)
      .and_then(|v| v.to_str().ok())
      .ok_or_else(|| ApiError::Unauthenticated(format!("{ACTOR_HEADER} header required")))?;

    let user_id = Uuid::parse_str(raw.trim())
      .map_err(|_| ApiError::Unauthenticated(format!("{ACTOR_HEADER} is not a valid id")))?;

    Ok(CurrentActor(Actor::new(user_id)))
  }
}
