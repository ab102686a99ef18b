//! Reference rows: the authoritative workflow record for an achievement.
//!
//! Each content record has exactly one reference row. The row's `status` is
//! the single source of truth and only moves along the edges encoded in
//! [`Status::can_transition_to`]. Every edge is applied by the reference
//! store as one conditional write guarded on the expected current status.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  achievement::{Achievement, ContentId},
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Draft,
  Submitted,
  Verified,
  Rejected,
  Deleted,
}

impl Status {
  pub const ALL: [Status; 5] = [
    Self::Draft,
    Self::Submitted,
    Self::Verified,
    Self::Rejected,
    Self::Deleted,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Draft => "draft",
      Self::Submitted => "submitted",
      Self::Verified => "verified",
      Self::Rejected => "rejected",
      Self::Deleted => "deleted",
    }
  }

  /// Whether `self → next` is an edge of the workflow graph.
  ///
  /// The administrator force-delete edge makes every non-deleted status
  /// reach `Deleted`.
  pub fn can_transition_to(self, next: Status) -> bool {
    use Status::*;
    matches!(
      (self, next),
      (Draft, Submitted)
        | (Submitted, Verified)
        | (Submitted, Rejected)
        | (Draft | Submitted | Verified | Rejected, Deleted)
    )
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Status {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim().to_lowercase();
    Self::ALL
      .into_iter()
      .find(|st| st.as_str() == wanted)
      .ok_or_else(|| Error::validation(format!("unknown status: {s:?}")))
  }
}

// ─── Reference row ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementReference {
  pub reference_id:   Uuid,
  pub student_id:     Uuid,
  /// Pointer into the content store; integrity is application-level only.
  pub content_id:     ContentId,
  pub status:         Status,
  /// Set once, on `draft → submitted`.
  pub submitted_at:   Option<DateTime<Utc>>,
  /// Set on review and on any move to `deleted`.
  pub verified_at:    Option<DateTime<Utc>>,
  /// Reviewer or administrator. Never set by an owner's own discard.
  pub verified_by:    Option<Uuid>,
  /// Present only while `status` is `rejected`.
  pub rejection_note: Option<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

// ─── Guarded writes ──────────────────────────────────────────────────────────

/// Result of a conditional write. `Unmatched` means zero rows satisfied the
/// guard; no finer reason is available or wanted.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Applied,
  Unmatched,
}

impl Transition {
  pub fn from_affected(rows: usize) -> Self {
    if rows == 0 { Self::Unmatched } else { Self::Applied }
  }

  pub fn applied(self) -> bool { matches!(self, Self::Applied) }
}

/// A reviewer's decision on a submitted achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
  Verified,
  Rejected,
}

impl FromStr for ReviewDecision {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "verified" => Ok(Self::Verified),
      "rejected" => Ok(Self::Rejected),
      _ => Err(Error::validation("review status must be verified or rejected")),
    }
  }
}

/// A validated review outcome, ready for the reference store. A rejection
/// always carries a non-empty note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
  Verified,
  Rejected { note: String },
}

impl Verdict {
  /// Pair a decision with its optional note. Rejecting requires a note that
  /// is non-empty after trimming; a note given with an approval is dropped.
  pub fn new(decision: ReviewDecision, note: Option<&str>) -> Result<Self> {
    match decision {
      ReviewDecision::Verified => Ok(Self::Verified),
      ReviewDecision::Rejected => match note.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(Self::Rejected { note: n.to_owned() }),
        _ => Err(Error::validation("rejection_note is required when rejecting")),
      },
    }
  }

  pub fn status(&self) -> Status {
    match self {
      Self::Verified => Status::Verified,
      Self::Rejected { .. } => Status::Rejected,
    }
  }

  pub fn note(&self) -> Option<&str> {
    match self {
      Self::Verified => None,
      Self::Rejected { note } => Some(note),
    }
  }
}

// ─── Combined views ──────────────────────────────────────────────────────────

/// A reference row joined with its content. `achievement` is `None` when the
/// content lookup missed, e.g. after a partially completed hard delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementView {
  pub reference:   AchievementReference,
  pub achievement: Option<Achievement>,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:     Vec<T>,
  /// Rows matching the query across all pages.
  pub total:     u64,
  pub page:      u64,
  pub page_size: u64,
}
