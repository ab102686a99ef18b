//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// The only message a client ever sees for a failed guard. Missing rows,
/// rows owned by someone else and rows in the wrong state look identical.
pub const GUARD_FAILED_MESSAGE: &str = "achievement cannot be processed";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No usable actor identity on the request.
  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Lifecycle(#[from] accolade_core::Error),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use accolade_core::Error as E;

    let (status, message) = match &self {
      ApiError::Unauthenticated(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Lifecycle(e) => match e {
        E::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
        E::Unauthorized(m) => (StatusCode::FORBIDDEN, m.clone()),
        E::GuardFailed => (StatusCode::UNPROCESSABLE_ENTITY, GUARD_FAILED_MESSAGE.to_owned()),
        E::StoreUnavailable(_) | E::Timeout { .. } => {
          error!(error = %e, "request failed on store");
          (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
      },
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn status_of(err: ApiError) -> StatusCode { err.into_response().status() }

  #[test]
  fn lifecycle_errors_map_to_statuses() {
    use accolade_core::Error as E;

    assert_eq!(status_of(E::Validation("x".into()).into()), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(E::Unauthorized("x".into()).into()), StatusCode::FORBIDDEN);
    assert_eq!(status_of(E::GuardFailed.into()), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
      status_of(E::Timeout { operation: "references.submit" }.into()),
      StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
      status_of(E::StoreUnavailable("disk full".into()).into()),
      StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
      status_of(ApiError::Unauthenticated("missing".into())),
      StatusCode::UNAUTHORIZED
    );
  }
}
