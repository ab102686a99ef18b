//! Error types for `accolade-core`.

use thiserror::Error;

/// Everything the lifecycle coordinator can report to its caller.
///
/// [`Error::GuardFailed`] merges "no such record", "not yours" and "wrong
/// state" into one variant. Callers must present it uniformly so
/// that the existence of other students' records cannot be probed.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("achievement not found, not accessible, or in the wrong state")]
  GuardFailed,

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A store call ran past its deadline. Whether it took effect is unknown.
  #[error("{operation} exceeded its deadline; outcome unknown")]
  Timeout { operation: &'static str },
}

impl Error {
  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  /// Whether the caller may safely repeat the whole operation.
  ///
  /// Guarded transitions are idempotent and hard delete
  /// treats already-absent content as success, so every infrastructure
  /// failure is retryable. Input and authorization failures never are.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::StoreUnavailable(_) | Self::Timeout { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
