//! Directory reads over the relational database.
//!
//! Roles, users, students and advisors belong to other subsystems; they live
//! in this database only so reference listings can join on `advisor_id`.
//! The `add_*` helpers exist for provisioning and tests.

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use accolade_core::directory::{
  Actor, IdentityResolver, ReviewerDirectory, StudentDirectory, StudentRecord,
};

use crate::{
  Result, SqliteStore,
  encode::{RawStudent, decode_uuid, encode_dt, encode_uuid, now},
};

// ─── Provisioning ────────────────────────────────────────────────────────────

impl SqliteStore {
  /// Return the id of the role called `name`, creating it if needed.
  pub async fn ensure_role(&self, name: &str) -> Result<Uuid> {
    let name = name.trim().to_lowercase();
    let candidate = encode_uuid(Uuid::new_v4());

    let id: String = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO roles (role_id, name) VALUES (?1, ?2)",
          rusqlite::params![candidate, name],
        )?;
        Ok(conn.query_row(
          "SELECT role_id FROM roles WHERE name = ?1",
          rusqlite::params![name],
          |r| r.get(0),
        )?)
      })
      .await?;

    decode_uuid(&id)
  }

  /// Create a user account carrying `role_id`.
  pub async fn add_user(&self, username: &str, role_id: Uuid) -> Result<Uuid> {
    let user_id = Uuid::new_v4();
    let id_str = encode_uuid(user_id);
    let username = username.to_owned();
    let role_str = encode_uuid(role_id);
    let at_str = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, role_id, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, username, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user_id)
  }

  /// Attach an advisor record to an existing user.
  pub async fn add_advisor(&self, user_id: Uuid, employee_number: &str) -> Result<Uuid> {
    let advisor_id = Uuid::new_v4();
    let id_str = encode_uuid(advisor_id);
    let user_str = encode_uuid(user_id);
    let number = employee_number.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO advisors (advisor_id, user_id, employee_number) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, user_str, number],
        )?;
        Ok(())
      })
      .await?;

    Ok(advisor_id)
  }

  /// Attach a student record to an existing user, optionally assigning an
  /// advisor.
  pub async fn add_student(
    &self,
    user_id: Uuid,
    student_number: &str,
    advisor_id: Option<Uuid>,
  ) -> Result<Uuid> {
    let student_id = Uuid::new_v4();
    let id_str = encode_uuid(student_id);
    let user_str = encode_uuid(user_id);
    let number = student_number.to_owned();
    let advisor_str = advisor_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO students (student_id, user_id, student_number, advisor_id)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, user_str, number, advisor_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(student_id)
  }

  async fn lookup_id(&self, sql: &'static str, key: Uuid) -> Result<Option<Uuid>> {
    let key_str = encode_uuid(key);
    let found: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![key_str], |r| r.get(0))
            .optional()?,
        )
      })
      .await?;
    found.as_deref().map(decode_uuid).transpose()
  }
}

// ─── Collaborator impls ──────────────────────────────────────────────────────

impl IdentityResolver for SqliteStore {
  type Error = crate::Error;

  async fn resolve_role(&self, actor: Actor) -> Result<Option<String>> {
    let user_str = encode_uuid(actor.user_id);
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT r.name FROM users u JOIN roles r ON r.role_id = u.role_id
                  WHERE u.user_id = ?1",
                rusqlite::params![user_str],
                |r| r.get(0),
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn resolve_owned_student_id(&self, actor: Actor) -> Result<Option<Uuid>> {
    self
      .lookup_id("SELECT student_id FROM students WHERE user_id = ?1", actor.user_id)
      .await
  }
}

impl StudentDirectory for SqliteStore {
  type Error = crate::Error;

  async fn get_student_by_id(&self, student_id: Uuid) -> Result<Option<StudentRecord>> {
    let id_str = encode_uuid(student_id);
    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT student_id, user_id, student_number, program, advisor_id
                 FROM students WHERE student_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawStudent {
                  student_id:     row.get(0)?,
                  user_id:        row.get(1)?,
                  student_number: row.get(2)?,
                  program:        row.get(3)?,
                  advisor_id:     row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawStudent::into_record).transpose()
  }

  async fn get_advisor_of(&self, student_id: Uuid) -> Result<Option<Uuid>> {
    let id_str = encode_uuid(student_id);
    let found: Option<Option<String>> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT advisor_id FROM students WHERE student_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    found.flatten().as_deref().map(decode_uuid).transpose()
  }
}

impl ReviewerDirectory for SqliteStore {
  type Error = crate::Error;

  async fn get_reviewer_by_actor(&self, actor: Actor) -> Result<Option<Uuid>> {
    self
      .lookup_id("SELECT advisor_id FROM advisors WHERE user_id = ?1", actor.user_id)
      .await
  }
}
