//! Handlers for `/achievements` and `/achievement-references`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/achievements` | Body: [`AchievementRequest`]; 201 + ids |
//! | `GET`    | `/achievements` | `?page&limit`; references joined with content |
//! | `GET`    | `/achievements/:id` | 422 if outside the caller's scope |
//! | `GET`    | `/achievement-references` | `?page&limit`; reference rows only |
//! | `PUT`    | `/achievements/:id/submit` | Owner only |
//! | `PUT`    | `/achievements/:id/review` | Body: `{"status":"verified"\|"rejected","rejection_note":"..."}` |
//! | `PUT`    | `/achievements/:id/soft-delete` | Owner only, drafts only |
//! | `PUT`    | `/achievements/:id/force-delete` | Administrators only |
//! | `DELETE` | `/achievements/:id` | Administrators only; row must be `deleted` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{FromRequestParts, Path, Query, State, rejection::JsonRejection},
  http::{StatusCode, request::Parts},
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use accolade_core::{
  Lifecycle,
  achievement::AchievementRequest,
  directory::Directory,
  reference::{AchievementReference, AchievementView, Page, ReviewDecision, Status},
  scope::Role,
  store::{ContentStore, ReferenceStore},
};

use crate::{actor::CurrentActor, error::ApiError};

type Shared<C, R, D> = State<Arc<Lifecycle<C, R, D>>>;

/// Acknowledgement of a successful transition.
#[derive(Debug, Serialize, Deserialize)]
pub struct Transitioned {
  pub reference_id: Uuid,
  pub status:       Status,
}

/// The `{id}` path segment. A malformed id is rejected as an [`ApiError`]
/// so the body stays JSON.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceId(pub Uuid);

impl<S> FromRequestParts<S> for ReferenceId
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Path(id) = Path::<Uuid>::from_request_parts(parts, state).await?;
    Ok(ReferenceId(id))
  }
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /achievements`
pub async fn create<C, R, D>(
  State(lifecycle): Shared<C, R, D>,
  CurrentActor(actor): CurrentActor,
  body: Result<Json<AchievementRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  let Json(request) = body?;
  let created = lifecycle.create(actor, request).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Reads ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  /// 1-based. Missing or non-positive means the first page.
  pub page:  Option<i64>,
  /// Missing or non-positive means the configured default.
  pub limit: Option<i64>,
}

impl PageParams {
  fn resolve(&self) -> (i64, i64) { (self.page.unwrap_or(1), self.limit.unwrap_or(0)) }
}

/// `GET /achievements[?page=<n>&limit=<n>]`
pub async fn list<C, R, D>(
  State(lifecycle): Shared<C, R, D>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<AchievementView>>, ApiError>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  let (page, limit) = params.resolve();
  Ok(Json(lifecycle.list(actor, page, limit).await?))
}

/// `GET /achievement-references[?page=<n>&limit=<n>]`
pub async fn list_references<C, R, D>(
  State(lifecycle): Shared<C, R, D>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<AchievementReference>>, ApiError>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  let (page, limit) = params.resolve();
  Ok(Json(lifecycle.list_references(actor, page, limit).await?))
}

/// `GET /achievements/:id`
pub async fn get_one<C, R, D>(
  State(lifecycle): Shared<C, R, D>,
  CurrentActor(actor): CurrentActor,
  ReferenceId(id): ReferenceId,
) -> Result<Json<AchievementView>, ApiError>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  Ok(Json(lifecycle.get(actor, id).await?))
}

// ─── Transitions ──────────────────────────────────────────────────────────────

/// `PUT /achievements/:id/submit`
pub async fn submit<C, R, D>(
  State(lifecycle): Shared<C, R, D>,
  CurrentActor(actor): CurrentActor,
  ReferenceId(id): ReferenceId,
) -> Result<Json<Transitioned>, ApiError>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  lifecycle.submit(actor, id).await?;
  Ok(Json(Transitioned { reference_id: id, status: Status::Submitted }))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status:         ReviewDecision,
  #[serde(default)]
  pub rejection_note: Option<String>,
}

/// `PUT /achievements/:id/review`
pub async fn review<C, R, D>(
  State(lifecycle): Shared<C, R, D>,
  CurrentActor(actor): CurrentActor,
  ReferenceId(id): ReferenceId,
  body: Result<Json<ReviewBody>, JsonRejection>,
) -> Result<Json<Transitioned>, ApiError>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  let Json(body) = body?;
  lifecycle
    .review(actor, id, body.status, body.rejection_note.as_deref())
    .await?;
  let status = match body.status {
    ReviewDecision::Verified => Status::Verified,
    ReviewDecision::Rejected => Status::Rejected,
  };
  Ok(Json(Transitioned { reference_id: id, status }))
}

/// `PUT /achievements/:id/soft-delete`
pub async fn soft_delete<C, R, D>(
  State(lifecycle): Shared<C, R, D>,
  CurrentActor(actor): CurrentActor,
  ReferenceId(id): ReferenceId,
) -> Result<Json<Transitioned>, ApiError>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  lifecycle.soft_delete(actor, id).await?;
  Ok(Json(Transitioned { reference_id: id, status: Status::Deleted }))
}

/// `PUT /achievements/:id/force-delete`
pub async fn force_delete<C, R, D>(
  State(lifecycle): Shared<C, R, D>,
  CurrentActor(actor): CurrentActor,
  ReferenceId(id): ReferenceId,
) -> Result<Json<Transitioned>, ApiError>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  lifecycle.force_delete(actor, id).await?;
  Ok(Json(Transitioned { reference_id: id, status: Status::Deleted }))
}

/// `DELETE /achievements/:id`
///
/// The coordinator leaves hard-delete authorization to its caller, so the
/// administrator check lives here.
pub async fn hard_delete<C, R, D>(
  State(lifecycle): Shared<C, R, D>,
  CurrentActor(actor): CurrentActor,
  ReferenceId(id): ReferenceId,
) -> Result<StatusCode, ApiError>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  lifecycle.require_role(actor, Role::Administrator).await?;
  lifecycle.hard_delete(actor, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
