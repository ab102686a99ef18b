//! Integration tests against in-memory databases.


use std::sync::Arc;

use accolade_core::{
  Lifecycle, LifecycleConfig,
  achievement::AchievementRequest,
  directory::Actor,
};
use serde_json::json;
use uuid::Uuid;

use crate::{DocumentStore, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn documents() -> DocumentStore {
  DocumentStore::open_in_memory()
    .await
    .expect("in-memory document store")
}

/// A populated directory: one administrator, one auditor, two advisors and
/// two students. `student` is advised by `advisor`; `other_student` by
/// `other_advisor`.
struct World {
  refs:             Arc<SqliteStore>,
  docs:             Arc<DocumentStore>,
  lifecycle:        Lifecycle<DocumentStore, SqliteStore, SqliteStore>,
  admin:            Actor,
  auditor:          Actor,
  advisor:          Actor,
  advisor_id:       Uuid,
  other_advisor:    Actor,
  student:          Actor,
  student_id:       Uuid,
  other_student:    Actor,
  other_student_id: Uuid,
}

impl World {
  async fn new() -> Self {
    let refs = Arc::new(store().await);
    let docs = Arc::new(documents().await);

    let admin_role = refs.ensure_role("admin").await.unwrap();
    let staff_role = refs.ensure_role("staff").await.unwrap();
    let advisor_role = refs.ensure_role("advisor").await.unwrap();
    let student_role = refs.ensure_role("student").await.unwrap();

    let admin = refs.add_user("admin", admin_role).await.unwrap();
    let auditor = refs.add_user("auditor", staff_role).await.unwrap();

    let advisor = refs.add_user("advisor-b", advisor_role).await.unwrap();
    let advisor_id = refs.add_advisor(advisor, "L-001").await.unwrap();
    let other_advisor = refs.add_user("advisor-a", advisor_role).await.unwrap();
    let other_advisor_id = refs.add_advisor(other_advisor, "L-002").await.unwrap();

    let student = refs.add_user("student-s", student_role).await.unwrap();
    let student_id = refs
      .add_student(student, "S-001", Some(advisor_id))
      .await
      .unwrap();
    let other_student = refs.add_user("student-t", student_role).await.unwrap();
    let other_student_id = refs
      .add_student(other_student, "S-002", Some(other_advisor_id))
      .await
      .unwrap();

    let lifecycle = Lifecycle::new(
      docs.clone(),
      refs.clone(),
      refs.clone(),
      LifecycleConfig::default(),
    );

    Self {
      refs,
      docs,
      lifecycle,
      admin: Actor::new(admin),
      auditor: Actor::new(auditor),
      advisor: Actor::new(advisor),
      advisor_id,
      other_advisor: Actor::new(other_advisor),
      student: Actor::new(student),
      student_id,
      other_student: Actor::new(other_student),
      other_student_id,
    }
  }
}

fn academic(title: &str) -> AchievementRequest {
  AchievementRequest {
    category: "academic".into(),
    title: title.into(),
    description: "Dean's list".into(),
    details: json!({ "score": 3.9 }),
    ..Default::default()
  }
}
