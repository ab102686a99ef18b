//! Role and scope resolution.
//!
//! Given an actor, decide which statuses they may observe and which
//! ownership filter applies to anything they list. Passing the status scope
//! is never by itself authorization to transition a row.

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  deadline::bounded,
  directory::{Actor, Directory},
  reference::{AchievementReference, Status},
};

// ─── Role ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Full visibility; may review and force-delete any row.
  Administrator,
  /// Owns achievements; sees their own rows except deleted ones.
  Student,
  /// Reviewer for the students they advise; sees only submitted rows.
  Advisor,
  /// Read-only view of reviewed rows.
  Auditor,
}

impl Role {
  /// Statuses this role may observe.
  pub fn visible_statuses(self) -> &'static [Status] {
    match self {
      Self::Administrator => &Status::ALL,
      Self::Student => &[
        Status::Draft,
        Status::Submitted,
        Status::Verified,
        Status::Rejected,
      ],
      Self::Advisor => &[Status::Submitted],
      Self::Auditor => &[Status::Verified, Status::Rejected],
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Administrator => "administrator",
      Self::Student => "student",
      Self::Advisor => "advisor",
      Self::Auditor => "auditor",
    })
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "admin" | "administrator" => Ok(Self::Administrator),
      "student" => Ok(Self::Student),
      "advisor" => Ok(Self::Advisor),
      "staff" | "auditor" => Ok(Self::Auditor),
      other => Err(Error::Unauthorized(format!(
        "role {other:?} has no access to achievements"
      ))),
    }
  }
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// What an actor may see: a status set plus at most one ownership filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
  pub role:       Role,
  pub statuses:   &'static [Status],
  /// Only rows owned by this student.
  pub student_id: Option<Uuid>,
  /// Only rows whose owner is advised by this advisor.
  pub advisor_id: Option<Uuid>,
}

impl Scope {
  fn for_role(role: Role) -> Self {
    Self {
      role,
      statuses: role.visible_statuses(),
      student_id: None,
      advisor_id: None,
    }
  }

  /// Whether `reference` falls inside this scope. `advisor_of_owner` is the
  /// advisor of the row's owning student and only matters for advisors.
  pub fn admits(
    &self,
    reference: &AchievementReference,
    advisor_of_owner: Option<Uuid>,
  ) -> bool {
    if !self.statuses.contains(&reference.status) {
      return false;
    }
    if let Some(student) = self.student_id
      && reference.student_id != student
    {
      return false;
    }
    match self.advisor_id {
      Some(advisor) => advisor_of_owner == Some(advisor),
      None => true,
    }
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Resolves [`Role`]s and [`Scope`]s against the directory collaborators.
pub struct ScopeResolver<D> {
  directory: Arc<D>,
  timeout:   Duration,
}

impl<D: Directory> ScopeResolver<D> {
  pub fn new(directory: Arc<D>, timeout: Duration) -> Self {
    Self { directory, timeout }
  }

  /// The actor's role. Fails with [`Error::Unauthorized`] when the account
  /// has no role or a role outside the four known ones.
  pub async fn role(&self, actor: Actor) -> Result<Role> {
    bounded(
      self.timeout,
      "resolve_role",
      self.directory.resolve_role(actor),
    )
    .await?
    .ok_or_else(|| Error::Unauthorized("role not found".into()))?
    .parse()
  }

  /// The student record owned by `actor`.
  pub async fn student_of(&self, actor: Actor) -> Result<Uuid> {
    bounded(
      self.timeout,
      "resolve_owned_student_id",
      self.directory.resolve_owned_student_id(actor),
    )
    .await?
    .ok_or_else(|| Error::Unauthorized("actor has no student record".into()))
  }

  /// The advisor record owned by `actor`.
  pub async fn advisor_of(&self, actor: Actor) -> Result<Uuid> {
    bounded(
      self.timeout,
      "get_reviewer_by_actor",
      self.directory.get_reviewer_by_actor(actor),
    )
    .await?
    .ok_or_else(|| Error::Unauthorized("actor has no advisor record".into()))
  }

  /// Full listing scope for `actor`.
  pub async fn resolve(&self, actor: Actor) -> Result<Scope> {
    let role = self.role(actor).await?;
    let mut scope = Scope::for_role(role);
    match role {
      Role::Student => scope.student_id = Some(self.student_of(actor).await?),
      Role::Advisor => scope.advisor_id = Some(self.advisor_of(actor).await?),
      Role::Administrator | Role::Auditor => {}
    }
    Ok(scope)
  }
}
