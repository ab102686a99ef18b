//! [`SqliteStore`]: the SQLite implementation of [`ReferenceStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, params_from_iter, types::Value};
use tracing::{debug, trace};
use uuid::Uuid;

use accolade_core::{
  achievement::ContentId,
  reference::{AchievementReference, Status, Transition, Verdict},
  store::{ReferenceQuery, ReferenceStore},
};

use crate::{
  Result,
  encode::{
    REFERENCE_COLUMNS, RawReference, encode_dt, encode_status, encode_uuid, now, opt_text,
    text,
  },
  schema::REFERENCE_SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The relational store, backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    debug!(path = %path.as_ref().display(), "opening reference database");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(REFERENCE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run one conditional write and report whether any row matched.
  async fn guarded(&self, sql: &'static str, params: Vec<Value>) -> Result<Transition> {
    let affected = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, params_from_iter(params))?))
      .await?;
    trace!(affected, "conditional write");
    Ok(Transition::from_affected(affected))
  }
}

// ─── ReferenceStore impl ─────────────────────────────────────────────────────

impl ReferenceStore for SqliteStore {
  type Error = crate::Error;

  async fn create_draft(
    &self,
    student_id: Uuid,
    content_id: ContentId,
  ) -> Result<AchievementReference> {
    let at = now();
    let reference = AchievementReference {
      reference_id:   Uuid::new_v4(),
      student_id,
      content_id,
      status:         Status::Draft,
      submitted_at:   None,
      verified_at:    None,
      verified_by:    None,
      rejection_note: None,
      created_at:     at,
      updated_at:     at,
    };

    let id_str      = encode_uuid(reference.reference_id);
    let student_str = encode_uuid(student_id);
    let content_str = reference.content_id.as_str().to_owned();
    let at_str      = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO achievement_references
             (reference_id, student_id, content_id, status, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![
            id_str,
            student_str,
            content_str,
            encode_status(Status::Draft),
            at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(reference)
  }

  async fn submit(&self, reference_id: Uuid, student_id: Uuid) -> Result<Transition> {
    self
      .guarded(
        "UPDATE achievement_references
            SET status = ?1, submitted_at = ?2, updated_at = ?2
          WHERE reference_id = ?3 AND student_id = ?4 AND status = ?5",
        vec![
          text(encode_status(Status::Submitted)),
          text(encode_dt(now())),
          text(encode_uuid(reference_id)),
          text(encode_uuid(student_id)),
          text(encode_status(Status::Draft)),
        ],
      )
      .await
  }

  async fn review(
    &self,
    reference_id: Uuid,
    reviewer: Uuid,
    verdict: Verdict,
  ) -> Result<Transition> {
    // A verified row always ends up with a NULL note.
    self
      .guarded(
        "UPDATE achievement_references
            SET status = ?1, verified_at = ?2, verified_by = ?3,
                rejection_note = ?4, updated_at = ?2
          WHERE reference_id = ?5 AND status = ?6",
        vec![
          text(encode_status(verdict.status())),
          text(encode_dt(now())),
          text(encode_uuid(reviewer)),
          opt_text(verdict.note()),
          text(encode_uuid(reference_id)),
          text(encode_status(Status::Submitted)),
        ],
      )
      .await
  }

  async fn discard(&self, reference_id: Uuid, student_id: Uuid) -> Result<Transition> {
    self
      .guarded(
        "UPDATE achievement_references
            SET status = ?1, verified_at = ?2, verified_by = NULL,
                rejection_note = NULL, updated_at = ?2
          WHERE reference_id = ?3 AND student_id = ?4 AND status = ?5",
        vec![
          text(encode_status(Status::Deleted)),
          text(encode_dt(now())),
          text(encode_uuid(reference_id)),
          text(encode_uuid(student_id)),
          text(encode_status(Status::Draft)),
        ],
      )
      .await
  }

  async fn force_delete(&self, reference_id: Uuid, admin: Uuid) -> Result<Transition> {
    self
      .guarded(
        "UPDATE achievement_references
            SET status = ?1, verified_at = ?2, verified_by = ?3,
                rejection_note = NULL, updated_at = ?2
          WHERE reference_id = ?4 AND status != ?1",
        vec![
          text(encode_status(Status::Deleted)),
          text(encode_dt(now())),
          text(encode_uuid(admin)),
          text(encode_uuid(reference_id)),
        ],
      )
      .await
  }

  async fn purge(&self, reference_id: Uuid) -> Result<Transition> {
    self
      .guarded(
        "DELETE FROM achievement_references WHERE reference_id = ?1 AND status = ?2",
        vec![
          text(encode_uuid(reference_id)),
          text(encode_status(Status::Deleted)),
        ],
      )
      .await
  }

  async fn get(&self, reference_id: Uuid) -> Result<Option<AchievementReference>> {
    let id_str = encode_uuid(reference_id);

    let raw: Option<RawReference> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {REFERENCE_COLUMNS} FROM achievement_references ar WHERE ar.reference_id = ?1"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawReference::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReference::into_reference).transpose()
  }

  async fn list_by_statuses(
    &self,
    query: &ReferenceQuery,
  ) -> Result<(Vec<AchievementReference>, u64)> {
    // Build the WHERE clause and its positional arguments together so the
    // placeholder numbers always line up.
    let mut args: Vec<Value> = query
      .statuses
      .iter()
      .map(|s| text(encode_status(*s)))
      .collect();
    let placeholders = (1..=args.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let mut conds = vec![format!("ar.status IN ({placeholders})")];
    let mut join = "";

    if let Some(student_id) = query.student_id {
      args.push(text(encode_uuid(student_id)));
      conds.push(format!("ar.student_id = ?{}", args.len()));
    }
    if let Some(advisor_id) = query.advisor_id {
      join = " JOIN students s ON s.student_id = ar.student_id";
      args.push(text(encode_uuid(advisor_id)));
      conds.push(format!("s.advisor_id = ?{}", args.len()));
    }
    let where_clause = conds.join(" AND ");

    let count_sql =
      format!("SELECT COUNT(*) FROM achievement_references ar{join} WHERE {where_clause}");
    let list_sql = format!(
      "SELECT {REFERENCE_COLUMNS}
         FROM achievement_references ar{join}
        WHERE {where_clause}
        ORDER BY ar.created_at DESC, ar.rowid DESC
        LIMIT ?{} OFFSET ?{}",
      args.len() + 1,
      args.len() + 2,
    );
    let limit = i64::try_from(query.page_size).unwrap_or(i64::MAX);
    let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

    let (raws, total): (Vec<RawReference>, i64) = self
      .conn
      .call(move |conn| {
        let total: i64 =
          conn.query_row(&count_sql, params_from_iter(args.iter()), |r| r.get(0))?;

        args.push(Value::Integer(limit));
        args.push(Value::Integer(offset));
        let mut stmt = conn.prepare(&list_sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), RawReference::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let refs = raws
      .into_iter()
      .map(RawReference::into_reference)
      .collect::<Result<Vec<_>>>()?;
    Ok((refs, total.max(0) as u64))
  }
}
