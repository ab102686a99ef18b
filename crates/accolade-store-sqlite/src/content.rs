//! [`DocumentStore`]: achievement content kept as JSON documents.
//!
//! A dumb keyed store: no status, no ownership checks. It lives in its own
//! database, independent of the reference rows that point into it.

use std::path::Path;

use rusqlite::{params_from_iter, types::Value};
use tracing::debug;
use uuid::Uuid;

use accolade_core::{
  achievement::{Achievement, ContentId, NewAchievement},
  store::ContentStore,
};

use crate::{
  Result,
  encode::{encode_dt, encode_uuid, now, text},
  schema::CONTENT_SCHEMA,
};

const CONTENT_ID_LEN: usize = 24;

/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct DocumentStore {
  conn: tokio_rusqlite::Connection,
}

impl DocumentStore {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    debug!(path = %path.as_ref().display(), "opening content database");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

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
        conn.execute_batch(CONTENT_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// A fresh 24-character lowercase hex identifier.
fn new_content_id() -> ContentId {
  let hex = Uuid::new_v4().simple().to_string();
  ContentId::new(&hex[..CONTENT_ID_LEN])
}

/// Identifiers this store could have issued. Anything else cannot resolve.
fn is_well_formed(id: &ContentId) -> bool {
  let s = id.as_str();
  s.len() == CONTENT_ID_LEN
    && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl ContentStore for DocumentStore {
  type Error = crate::Error;

  async fn create(&self, student_id: Uuid, input: NewAchievement) -> Result<Achievement> {
    let at = now();
    let achievement = Achievement {
      content_id: new_content_id(),
      student_id,
      title: input.title,
      description: input.description,
      details: input.details,
      attachments: input.attachments,
      tags: input.tags,
      points: input.points,
      created_at: at,
      updated_at: at,
    };

    let id_str       = achievement.content_id.as_str().to_owned();
    let student_str  = encode_uuid(student_id);
    let category_str = achievement.category().as_str();
    let body         = serde_json::to_string(&achievement)?;
    let at_str       = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents
             (content_id, student_id, category, body_json, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, student_str, category_str, body, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(achievement)
  }

  async fn get_many(&self, ids: Vec<ContentId>) -> Result<Vec<Achievement>> {
    let args: Vec<Value> = ids
      .iter()
      .filter(|id| is_well_formed(id))
      .map(|id| text(id.as_str()))
      .collect();
    if args.is_empty() {
      return Ok(Vec::new());
    }

    let placeholders = (1..=args.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!("SELECT body_json FROM documents WHERE content_id IN ({placeholders})");

    let bodies: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    bodies
      .iter()
      .map(|b| Ok(serde_json::from_str(b)?))
      .collect()
  }

  async fn delete(&self, id: ContentId) -> Result<bool> {
    if !is_well_formed(&id) {
      return Ok(false);
    }
    let id_str = id.as_str().to_owned();

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents WHERE content_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(affected > 0)
  }
}
