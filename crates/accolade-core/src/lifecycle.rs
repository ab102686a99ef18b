//! The lifecycle coordinator.
//!
//! Sequences content-store and reference-store calls for create, submit,
//! review, delete and listing. Holds no mutable state of its own; every race
//! is settled by the reference store's conditional writes.
//!
//! Cross-store writes are not transactional. A failed reference insert after
//! a successful content write leaves orphaned content, and hard delete removes
//! content before the reference row. Neither is compensated here.

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  achievement::{AchievementRequest, ContentId},
  deadline::bounded,
  directory::{Actor, Directory},
  reference::{
    AchievementReference, AchievementView, Page, ReviewDecision, Status, Transition,
    Verdict,
  },
  scope::{Role, Scope, ScopeResolver},
  store::{ContentStore, ReferenceQuery, ReferenceStore},
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
  /// Deadline applied to every individual store or directory call.
  pub store_timeout:     Duration,
  /// Page size used when a caller asks for zero or fewer rows.
  pub default_page_size: u64,
}

impl Default for LifecycleConfig {
  fn default() -> Self {
    Self {
      store_timeout:     Duration::from_secs(5),
      default_page_size: 10,
    }
  }
}

/// Identifiers of a freshly created achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
  pub reference_id: Uuid,
  pub content_id:   ContentId,
  pub status:       Status,
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

pub struct Lifecycle<C, R, D> {
  content:    Arc<C>,
  references: Arc<R>,
  directory:  Arc<D>,
  scopes:     ScopeResolver<D>,
  config:     LifecycleConfig,
}

impl<C, R, D> Lifecycle<C, R, D>
where
  C: ContentStore,
  R: ReferenceStore,
  D: Directory,
{
  pub fn new(
    content: Arc<C>,
    references: Arc<R>,
    directory: Arc<D>,
    config: LifecycleConfig,
  ) -> Self {
    let scopes = ScopeResolver::new(directory.clone(), config.store_timeout);
    Self { content, references, directory, scopes, config }
  }

  pub fn config(&self) -> &LifecycleConfig { &self.config }

  /// Fail with [`Error::Unauthorized`] unless `actor` holds `role`. Used by
  /// outer layers for gates this coordinator does not apply itself.
  pub async fn require_role(&self, actor: Actor, role: Role) -> Result<()> {
    let actual = self.scopes.role(actor).await?;
    if actual != role {
      return Err(Error::Unauthorized(format!("{role} role required")));
    }
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Validate `request`, store its content, then create the `draft`
  /// reference row pointing at it.
  pub async fn create(&self, actor: Actor, request: AchievementRequest) -> Result<Created> {
    let input = request.normalize()?;
    let student_id = self.scopes.student_of(actor).await?;

    let achievement = bounded(
      self.config.store_timeout,
      "content.create",
      self.content.create(student_id, input),
    )
    .await?;
    let content_id = achievement.content_id;

    let reference = bounded(
      self.config.store_timeout,
      "references.create_draft",
      self.references.create_draft(student_id, content_id.clone()),
    )
    .await
    .inspect_err(|_| {
      warn!(%content_id, %student_id, "reference creation failed; content left orphaned");
    })?;

    info!(
      reference_id = %reference.reference_id,
      %content_id,
      %student_id,
      "achievement created"
    );
    Ok(Created {
      reference_id: reference.reference_id,
      content_id,
      status: reference.status,
    })
  }

  /// `draft → submitted`, for the owning student only.
  pub async fn submit(&self, actor: Actor, reference_id: Uuid) -> Result<()> {
    let student_id = self.scopes.student_of(actor).await?;
    let outcome = bounded(
      self.config.store_timeout,
      "references.submit",
      self.references.submit(reference_id, student_id),
    )
    .await?;
    self.settle(outcome, reference_id, actor, "submitted")
  }

  /// `submitted → verified | rejected`.
  ///
  /// Administrators may review any row. Advisors may only review rows whose
  /// owning student they advise; that relationship is checked here because
  /// the reference store's guard knows nothing about advisors.
  pub async fn review(
    &self,
    actor: Actor,
    reference_id: Uuid,
    decision: ReviewDecision,
    note: Option<&str>,
  ) -> Result<()> {
    let verdict = Verdict::new(decision, note)?;

    match self.scopes.role(actor).await? {
      Role::Administrator => {}
      Role::Advisor => {
        let advisor_id = self.scopes.advisor_of(actor).await?;
        let reference = self.fetch(reference_id).await?.ok_or(Error::GuardFailed)?;
        let assigned = bounded(
          self.config.store_timeout,
          "directory.get_advisor_of",
          self.directory.get_advisor_of(reference.student_id),
        )
        .await?;
        if assigned != Some(advisor_id) {
          warn!(%reference_id, actor = %actor.user_id, "advisor does not advise owning student");
          return Err(Error::GuardFailed);
        }
      }
      role => {
        return Err(Error::Unauthorized(format!("{role} may not review achievements")));
      }
    }

    let status = verdict.status();
    let outcome = bounded(
      self.config.store_timeout,
      "references.review",
      self.references.review(reference_id, actor.user_id, verdict),
    )
    .await?;
    self.settle(outcome, reference_id, actor, status.as_str())
  }

  /// `draft → deleted` by the owning student.
  pub async fn soft_delete(&self, actor: Actor, reference_id: Uuid) -> Result<()> {
    let student_id = self.scopes.student_of(actor).await?;
    let outcome = bounded(
      self.config.store_timeout,
      "references.discard",
      self.references.discard(reference_id, student_id),
    )
    .await?;
    self.settle(outcome, reference_id, actor, "discarded")
  }

  /// Any status except `deleted` → `deleted`, by an administrator.
  pub async fn force_delete(&self, actor: Actor, reference_id: Uuid) -> Result<()> {
    self.require_role(actor, Role::Administrator).await?;
    let outcome = bounded(
      self.config.store_timeout,
      "references.force_delete",
      self.references.force_delete(reference_id, actor.user_id),
    )
    .await?;
    self.settle(outcome, reference_id, actor, "force-deleted")
  }

  /// Erase a `deleted` achievement: content first, then the reference row.
  ///
  /// Content that is already gone counts as removed, so retrying after a
  /// failure between the two steps completes the purge. Authorization is the
  /// caller's concern.
  pub async fn hard_delete(&self, actor: Actor, reference_id: Uuid) -> Result<()> {
    let reference = self.fetch(reference_id).await?.ok_or(Error::GuardFailed)?;
    if reference.status != Status::Deleted {
      warn!(%reference_id, status = %reference.status, "hard delete refused");
      return Err(Error::GuardFailed);
    }

    let removed = bounded(
      self.config.store_timeout,
      "content.delete",
      self.content.delete(reference.content_id.clone()),
    )
    .await?;
    if !removed {
      warn!(%reference_id, content_id = %reference.content_id, "content already absent");
    }

    let outcome = bounded(
      self.config.store_timeout,
      "references.purge",
      self.references.purge(reference_id),
    )
    .await?;
    self.settle(outcome, reference_id, actor, "purged")
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Reference rows visible to `actor`, joined with their content.
  pub async fn list(&self, actor: Actor, page: i64, page_size: i64) -> Result<Page<AchievementView>> {
    let refs = self.list_references(actor, page, page_size).await?;
    let items = self.join_content(refs.items).await?;
    Ok(Page { items, total: refs.total, page: refs.page, page_size: refs.page_size })
  }

  /// Reference rows visible to `actor`, without content.
  pub async fn list_references(
    &self,
    actor: Actor,
    page: i64,
    page_size: i64,
  ) -> Result<Page<AchievementReference>> {
    let scope = self.scopes.resolve(actor).await?;
    let query = self.query_for(&scope, page, page_size);
    let (items, total) = bounded(
      self.config.store_timeout,
      "references.list_by_statuses",
      self.references.list_by_statuses(&query),
    )
    .await?;
    Ok(Page { items, total, page: query.page, page_size: query.page_size })
  }

  /// A single achievement, subject to the same scope as listing.
  pub async fn get(&self, actor: Actor, reference_id: Uuid) -> Result<AchievementView> {
    let scope = self.scopes.resolve(actor).await?;
    let reference = self.fetch(reference_id).await?.ok_or(Error::GuardFailed)?;

    let advisor_of_owner = match scope.advisor_id {
      Some(_) => bounded(
        self.config.store_timeout,
        "directory.get_advisor_of",
        self.directory.get_advisor_of(reference.student_id),
      )
      .await?,
      None => None,
    };
    if !scope.admits(&reference, advisor_of_owner) {
      return Err(Error::GuardFailed);
    }

    self
      .join_content(vec![reference])
      .await?
      .pop()
      .ok_or(Error::GuardFailed)
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn fetch(&self, reference_id: Uuid) -> Result<Option<AchievementReference>> {
    bounded(
      self.config.store_timeout,
      "references.get",
      self.references.get(reference_id),
    )
    .await
  }

  fn query_for(&self, scope: &Scope, page: i64, page_size: i64) -> ReferenceQuery {
    let page = u64::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
    let page_size = u64::try_from(page_size)
      .ok()
      .filter(|s| *s >= 1)
      .unwrap_or(self.config.default_page_size);
    ReferenceQuery {
      statuses: scope.statuses.to_vec(),
      student_id: scope.student_id,
      advisor_id: scope.advisor_id,
      page,
      page_size,
    }
  }

  /// Batch-fetch content for `refs` and join in memory. Rows whose content
  /// is missing are kept with `achievement: None`.
  async fn join_content(&self, refs: Vec<AchievementReference>) -> Result<Vec<AchievementView>> {
    if refs.is_empty() {
      return Ok(Vec::new());
    }
    let ids = refs.iter().map(|r| r.content_id.clone()).collect();
    let found = bounded(
      self.config.store_timeout,
      "content.get_many",
      self.content.get_many(ids),
    )
    .await?;

    let mut by_id: HashMap<ContentId, _> =
      found.into_iter().map(|a| (a.content_id.clone(), a)).collect();

    Ok(
      refs
        .into_iter()
        .map(|reference| {
          let achievement = by_id.remove(&reference.content_id);
          AchievementView { reference, achievement }
        })
        .collect(),
    )
  }

  fn settle(
    &self,
    outcome: Transition,
    reference_id: Uuid,
    actor: Actor,
    action: &'static str,
  ) -> Result<()> {
    match outcome {
      Transition::Applied => {
        info!(%reference_id, actor = %actor.user_id, action, "achievement transitioned");
        Ok(())
      }
      Transition::Unmatched => {
        warn!(%reference_id, actor = %actor.user_id, action, "transition guard failed");
        Err(Error::GuardFailed)
      }
    }
  }
}
