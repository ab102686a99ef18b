//! Read-only collaborators owned by other subsystems.
//!
//! Accounts, roles and the student/advisor directory are managed elsewhere.
//! The coordinator only asks these narrow questions of them.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated caller, identified by user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
  pub user_id: Uuid,
}

impl Actor {
  pub fn new(user_id: Uuid) -> Self { Self { user_id } }
}

/// A student directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
  pub student_id:     Uuid,
  pub user_id:        Uuid,
  pub student_number: String,
  pub program:        Option<String>,
  /// The advisor assigned to review this student's achievements.
  pub advisor_id:     Option<Uuid>,
}

pub trait IdentityResolver: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The raw role name attached to the actor's account, if any.
  fn resolve_role(
    &self,
    actor: Actor,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// The student record owned by the actor's account, if any.
  fn resolve_owned_student_id(
    &self,
    actor: Actor,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;
}

pub trait StudentDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_student_by_id(
    &self,
    student_id: Uuid,
  ) -> impl Future<Output = Result<Option<StudentRecord>, Self::Error>> + Send + '_;

  /// The advisor assigned to `student_id`. `None` when the student is
  /// unknown or has no advisor.
  fn get_advisor_of(
    &self,
    student_id: Uuid,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_ {
    async move {
      Ok(
        self
          .get_student_by_id(student_id)
          .await?
          .and_then(|s| s.advisor_id),
      )
    }
  }
}

pub trait ReviewerDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The advisor record owned by the actor's account, if any.
  fn get_reviewer_by_actor(
    &self,
    actor: Actor,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;
}

/// Everything the coordinator needs from the directory side.
pub trait Directory: IdentityResolver + StudentDirectory + ReviewerDirectory {}

impl<T> Directory for T where T: IdentityResolver + StudentDirectory + ReviewerDirectory {}
