//! Bounded store calls.

use std::{future::Future, time::Duration};

use crate::{Error, Result};

/// Run a collaborator call under `limit`, mapping its error into
/// [`Error::StoreUnavailable`] and an elapsed deadline into
/// [`Error::Timeout`]. Nothing is retried here.
pub(crate) async fn bounded<T, E, F>(
  limit: Duration,
  operation: &'static str,
  fut: F,
) -> Result<T>
where
  F: Future<Output = std::result::Result<T, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  match tokio::time::timeout(limit, fut).await {
    Ok(Ok(value)) => Ok(value),
    Ok(Err(e)) => {
      tracing::error!(operation, error = %e, "store call failed");
      Err(Error::StoreUnavailable(Box::new(e)))
    }
    Err(_) => {
      tracing::warn!(operation, ?limit, "store call exceeded deadline");
      Err(Error::Timeout { operation })
    }
  }
}
