//! The two store traits and their query type.
//!
//! [`ContentStore`] is a dumb keyed document store. [`ReferenceStore`] holds
//! the authoritative workflow rows and applies every transition as a single
//! conditional write. Backends live in other crates (e.g.
//! `accolade-store-sqlite`); the coordinator depends only on these traits.
//!
//! All methods return `Send` futures so the traits can be used from a
//! multi-threaded runtime (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  achievement::{Achievement, ContentId, NewAchievement},
  reference::{AchievementReference, Status, Transition, Verdict},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ReferenceStore::list_by_statuses`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceQuery {
  /// Only rows whose status is one of these.
  pub statuses:   Vec<Status>,
  /// Restrict to rows owned by this student.
  pub student_id: Option<Uuid>,
  /// Restrict to rows whose owning student is advised by this advisor.
  pub advisor_id: Option<Uuid>,
  /// 1-based.
  pub page:       u64,
  pub page_size:  u64,
}

impl ReferenceQuery {
  /// Rows to skip. Saturates for page numbers far past the end.
  pub fn offset(&self) -> u64 { self.page.saturating_sub(1).saturating_mul(self.page_size) }
}

// ─── Content store ───────────────────────────────────────────────────────────

pub trait ContentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new content record for `student_id`. The store assigns the
  /// identifier and both timestamps.
  fn create(
    &self,
    student_id: Uuid,
    input: NewAchievement,
  ) -> impl Future<Output = Result<Achievement, Self::Error>> + Send + '_;

  /// Fetch every record in `ids` that exists. Identifiers that do not
  /// resolve are omitted without error, so the result may be shorter.
  fn get_many(
    &self,
    ids: Vec<ContentId>,
  ) -> impl Future<Output = Result<Vec<Achievement>, Self::Error>> + Send + '_;

  /// Remove a record. Returns `false` if nothing matched `id`.
  fn delete(
    &self,
    id: ContentId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Reference store ─────────────────────────────────────────────────────────

/// The authoritative workflow store.
///
/// Each transition method is one conditional write whose predicate includes
/// the expected current status (and owner, where relevant). Zero affected
/// rows comes back as [`Transition::Unmatched`]; callers cannot and should
/// not tell "missing" from "not yours" from "wrong state".
pub trait ReferenceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert a `draft` row pointing at `content_id`.
  fn create_draft(
    &self,
    student_id: Uuid,
    content_id: ContentId,
  ) -> impl Future<Output = Result<AchievementReference, Self::Error>> + Send + '_;

  /// `draft → submitted` where the row is owned by `student_id`.
  fn submit(
    &self,
    reference_id: Uuid,
    student_id: Uuid,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;

  /// `submitted → verified | rejected`, attributing the review to
  /// `reviewer`.
  fn review(
    &self,
    reference_id: Uuid,
    reviewer: Uuid,
    verdict: Verdict,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;

  /// `draft → deleted` by the owning student. Leaves `verified_by` empty.
  fn discard(
    &self,
    reference_id: Uuid,
    student_id: Uuid,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;

  /// Any status other than `deleted` → `deleted`, by an administrator.
  fn force_delete(
    &self,
    reference_id: Uuid,
    admin: Uuid,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;

  /// Remove the row entirely, only if its status is `deleted`.
  fn purge(
    &self,
    reference_id: Uuid,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;

  fn get(
    &self,
    reference_id: Uuid,
  ) -> impl Future<Output = Result<Option<AchievementReference>, Self::Error>> + Send + '_;

  /// Rows matching `query`, newest-created first, plus the total match
  /// count across all pages.
  fn list_by_statuses<'a>(
    &'a self,
    query: &'a ReferenceQuery,
  ) -> impl Future<Output = Result<(Vec<AchievementReference>, u64), Self::Error>> + Send + 'a;
}
