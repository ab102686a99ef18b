//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with microsecond
//! precision so that text ordering matches time ordering. UUIDs are stored
//! as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use rusqlite::types::Value;
use uuid::Uuid;

use accolade_core::{
  achievement::ContentId,
  directory::StudentRecord,
  reference::{AchievementReference, Status},
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at storage precision, so values handed back to callers
/// compare equal to what a later read returns.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(s: Status) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<Status> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown status: {s:?}")))
}

// ─── Bind values ─────────────────────────────────────────────────────────────

pub fn text(s: impl Into<String>) -> Value { Value::Text(s.into()) }

pub fn opt_text(s: Option<impl Into<String>>) -> Value {
  s.map(text).unwrap_or(Value::Null)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawReference::from_row`]; expects the
/// `achievement_references` table aliased as `ar`.
pub const REFERENCE_COLUMNS: &str = "ar.reference_id, ar.student_id, ar.content_id, \
   ar.status, ar.submitted_at, ar.verified_at, ar.verified_by, ar.rejection_note, \
   ar.created_at, ar.updated_at";

/// Raw strings read directly from an `achievement_references` row.
pub struct RawReference {
  pub reference_id:   String,
  pub student_id:     String,
  pub content_id:     String,
  pub status:         String,
  pub submitted_at:   Option<String>,
  pub verified_at:    Option<String>,
  pub verified_by:    Option<String>,
  pub rejection_note: Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawReference {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reference_id:   row.get(0)?,
      student_id:     row.get(1)?,
      content_id:     row.get(2)?,
      status:         row.get(3)?,
      submitted_at:   row.get(4)?,
      verified_at:    row.get(5)?,
      verified_by:    row.get(6)?,
      rejection_note: row.get(7)?,
      created_at:     row.get(8)?,
      updated_at:     row.get(9)?,
    })
  }

  pub fn into_reference(self) -> Result<AchievementReference> {
    Ok(AchievementReference {
      reference_id:   decode_uuid(&self.reference_id)?,
      student_id:     decode_uuid(&self.student_id)?,
      content_id:     ContentId::new(self.content_id),
      status:         decode_status(&self.status)?,
      submitted_at:   decode_opt_dt(self.submitted_at)?,
      verified_at:    decode_opt_dt(self.verified_at)?,
      verified_by:    decode_opt_uuid(self.verified_by)?,
      rejection_note: self.rejection_note,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `students` row.
pub struct RawStudent {
  pub student_id:     String,
  pub user_id:        String,
  pub student_number: String,
  pub program:        Option<String>,
  pub advisor_id:     Option<String>,
}

impl RawStudent {
  pub fn into_record(self) -> Result<StudentRecord> {
    Ok(StudentRecord {
      student_id:     decode_uuid(&self.student_id)?,
      user_id:        decode_uuid(&self.user_id)?,
      student_number: self.student_number,
      program:        self.program,
      advisor_id:     decode_opt_uuid(self.advisor_id)?,
    })
  }
}
