use std::sync::Arc;

use accolade_core::{Lifecycle, LifecycleConfig, directory::Actor};
use accolade_store_sqlite::{DocumentStore, SqliteStore};
use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ACTOR_HEADER, api_router, error::GUARD_FAILED_MESSAGE};

struct Harness {
  app:     Router,
  admin:   Actor,
  advisor: Actor,
  student: Actor,
}

async fn harness() -> Harness {
  let refs = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let docs = Arc::new(DocumentStore::open_in_memory().await.unwrap());

  let admin_role = refs.ensure_role("admin").await.unwrap();
  let advisor_role = refs.ensure_role("advisor").await.unwrap();
  let student_role = refs.ensure_role("student").await.unwrap();

  let admin = refs.add_user("root", admin_role).await.unwrap();
  let advisor = refs.add_user("lecturer", advisor_role).await.unwrap();
  let advisor_id = refs.add_advisor(advisor, "L-100").await.unwrap();
  let student = refs.add_user("pupil", student_role).await.unwrap();
  refs.add_student(student, "S-100", Some(advisor_id)).await.unwrap();

  let lifecycle = Arc::new(Lifecycle::new(
    docs,
    refs.clone(),
    refs,
    LifecycleConfig::default(),
  ));

  Harness {
    app:     api_router(lifecycle),
    admin:   Actor::new(admin),
    advisor: Actor::new(advisor),
    student: Actor::new(student),
  }
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  actor: Option<Actor>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(actor) = actor {
    builder = builder.header(ACTOR_HEADER, actor.user_id.to_string());
  }
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };

  let res = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn new_achievement() -> Value {
  json!({
    "category": "publication",
    "title": "On Rust",
    "description": "Journal article",
    "details": { "publicationTitle": "On Rust", "authors": ["A. Student"] },
    "tags": ["research"]
  })
}

async fn create(h: &Harness) -> Uuid {
  let (status, body) =
    send(&h.app, Method::POST, "/achievements", Some(h.student), Some(new_achievement())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["status"], "draft");
  body["reference_id"].as_str().unwrap().parse().unwrap()
}

// ── Actor header ────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_actor_header_is_401() {
  let h = harness().await;
  let (status, body) = send(&h.app, Method::GET, "/achievements", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].as_str().unwrap().contains(ACTOR_HEADER));
}

#[tokio::test]
async fn malformed_actor_header_is_401() {
  let h = harness().await;
  let req = Request::builder()
    .uri("/achievements")
    .header(ACTOR_HEADER, "not-a-uuid")
    .body(Body::empty())
    .unwrap();
  let res = h.app.clone().oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_actor_is_403() {
  let h = harness().await;
  let stranger = Actor::new(Uuid::new_v4());
  let (status, _) = send(&h.app, Method::GET, "/achievements", Some(stranger), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_get() {
  let h = harness().await;
  let id = create(&h).await;

  let (status, body) =
    send(&h.app, Method::GET, &format!("/achievements/{id}"), Some(h.student), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["reference"]["status"], "draft");
  assert_eq!(body["achievement"]["title"], "On Rust");
  assert_eq!(body["achievement"]["details"]["category"], "publication");
}

#[tokio::test]
async fn create_with_missing_title_is_400() {
  let h = harness().await;
  let mut payload = new_achievement();
  payload["title"] = json!("");
  let (status, _) =
    send(&h.app, Method::POST, "/achievements", Some(h.student), Some(payload)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_body_is_400() {
  let h = harness().await;
  let req = Request::builder()
    .method(Method::POST)
    .uri("/achievements")
    .header(ACTOR_HEADER, h.student.user_id.to_string())
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{ not json"))
    .unwrap();
  let res = h.app.clone().oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_id_is_400_json() {
  let h = harness().await;
  for (method, uri) in [
    (Method::GET, "/achievements/not-a-uuid"),
    (Method::PUT, "/achievements/123/submit"),
    (Method::DELETE, "/achievements/xyz"),
  ] {
    let (status, body) = send(&h.app, method, uri, Some(h.admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }
}

// ── Transitions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_review_flow() {
  let h = harness().await;
  let id = create(&h).await;

  let (status, body) = send(
    &h.app,
    Method::PUT,
    &format!("/achievements/{id}/submit"),
    Some(h.student),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "submitted");

  let (status, body) = send(&h.app, Method::GET, "/achievements", Some(h.advisor), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total"], 1);

  let (status, body) = send(
    &h.app,
    Method::PUT,
    &format!("/achievements/{id}/review"),
    Some(h.advisor),
    Some(json!({ "status": "rejected", "rejection_note": "needs DOI" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "rejected");

  let (_, body) =
    send(&h.app, Method::GET, &format!("/achievements/{id}"), Some(h.student), None).await;
  assert_eq!(body["reference"]["rejection_note"], "needs DOI");
}

#[tokio::test]
async fn reject_without_note_is_400() {
  let h = harness().await;
  let id = create(&h).await;
  send(&h.app, Method::PUT, &format!("/achievements/{id}/submit"), Some(h.student), None).await;

  let (status, _) = send(
    &h.app,
    Method::PUT,
    &format!("/achievements/{id}/review"),
    Some(h.advisor),
    Some(json!({ "status": "rejected" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_review_status_is_400() {
  let h = harness().await;
  let id = create(&h).await;
  let (status, _) = send(
    &h.app,
    Method::PUT,
    &format!("/achievements/{id}/review"),
    Some(h.admin),
    Some(json!({ "status": "approved" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn guard_failures_share_one_message() {
  let h = harness().await;
  let id = create(&h).await;

  // Wrong state: a draft cannot be reviewed.
  let (status, wrong_state) = send(
    &h.app,
    Method::PUT,
    &format!("/achievements/{id}/review"),
    Some(h.admin),
    Some(json!({ "status": "verified" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  // Missing row.
  let (status, missing) = send(
    &h.app,
    Method::PUT,
    &format!("/achievements/{}/submit", Uuid::new_v4()),
    Some(h.student),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  assert_eq!(wrong_state, missing);
  assert_eq!(missing["error"], GUARD_FAILED_MESSAGE);
}

#[tokio::test]
async fn hard_delete_requires_admin_and_deleted_row() {
  let h = harness().await;
  let id = create(&h).await;
  let uri = format!("/achievements/{id}");

  let (status, _) = send(&h.app, Method::DELETE, &uri, Some(h.admin), None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) = send(
    &h.app,
    Method::PUT,
    &format!("/achievements/{id}/soft-delete"),
    Some(h.student),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(&h.app, Method::DELETE, &uri, Some(h.student), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = send(&h.app, Method::DELETE, &uri, Some(h.admin), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(body, Value::Null);

  let (status, _) = send(&h.app, Method::GET, &uri, Some(h.admin), None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn force_delete_by_admin_only() {
  let h = harness().await;
  let id = create(&h).await;
  let uri = format!("/achievements/{id}/force-delete");

  let (status, _) = send(&h.app, Method::PUT, &uri, Some(h.student), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = send(&h.app, Method::PUT, &uri, Some(h.admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "deleted");
}

// ── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_references_paginates() {
  let h = harness().await;
  for _ in 0..3 {
    create(&h).await;
  }

  let (status, body) = send(
    &h.app,
    Method::GET,
    "/achievement-references?page=2&limit=2",
    Some(h.student),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total"], 3);
  assert_eq!(body["page"], 2);
  assert_eq!(body["page_size"], 2);
  assert_eq!(body["items"].as_array().unwrap().len(), 1);
  assert!(body["items"][0].get("achievement").is_none());
}

#[tokio::test]
async fn list_defaults_page_and_limit() {
  let h = harness().await;
  create(&h).await;

  let (status, body) =
    send(&h.app, Method::GET, "/achievements?page=0&limit=-1", Some(h.admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["page"], 1);
  assert_eq!(body["page_size"], 10);
  assert_eq!(body["items"][0]["achievement"]["tags"][0], "research");
}
