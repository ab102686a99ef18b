//! JSON REST API for Accolade.
//!
//! Exposes an axum [`Router`] over a [`Lifecycle`] coordinator. The caller's
//! identity is read from the `x-actor-id` header; authenticating that header
//! and TLS are the embedding server's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", accolade_api::api_router(lifecycle.clone()))
//! ```

pub mod achievements;
pub mod actor;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, put},
};
use accolade_core::{
  Lifecycle,
  directory::Directory,
  store::{ContentStore, ReferenceStore},
};

pub use actor::{ACTOR_HEADER, CurrentActor};
pub use error::ApiError;

/// Build a fully-materialised API router for `lifecycle`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<C, R, D>(lifecycle: Arc<Lifecycle<C, R, D>>) -> Router<()>
where
  C: ContentStore + 'static,
  R: ReferenceStore + 'static,
  D: Directory + 'static,
{
  use achievements as a;

  Router::new()
    .route("/achievements", get(a::list::<C, R, D>).post(a::create::<C, R, D>))
    .route(
      "/achievements/{id}",
      get(a::get_one::<C, R, D>).delete(a::hard_delete::<C, R, D>),
    )
    .route("/achievements/{id}/submit", put(a::submit::<C, R, D>))
    .route("/achievements/{id}/review", put(a::review::<C, R, D>))
    .route("/achievements/{id}/soft-delete", put(a::soft_delete::<C, R, D>))
    .route("/achievements/{id}/force-delete", put(a::force_delete::<C, R, D>))
    .route("/achievement-references", get(a::list_references::<C, R, D>))
    .with_state(lifecycle)
}

#[cfg(test)]
mod tests;
