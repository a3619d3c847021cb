//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use shiftover_store_sqlite::SqliteStore;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

async fn make_store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.unwrap())
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
  (Utc::now() + TimeDelta::days(2))
    .date_naive()
    .and_hms_opt(h, m, 0)
    .unwrap()
    .and_utc()
}

async fn send(
  store: Arc<SqliteStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = api_router(store)
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let is_json = resp
    .headers()
    .get(header::CONTENT_TYPE)
    .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
  let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
  // Extractor rejections answer in plain text.
  let body = if bytes.is_empty() {
    Value::Null
  } else if is_json {
    serde_json::from_slice(&bytes).unwrap()
  } else {
    Value::String(String::from_utf8_lossy(&bytes).into_owned())
  };
  (status, body)
}

#[tokio::test]
async fn put_then_get() {
  let store = make_store().await;
  let alice = Uuid::new_v4();
  store.add_user(alice, "alice").await.unwrap();
  let uri = format!("/schedules/{}/temporary-schedules", Uuid::new_v4());

  let window = json!({
    "start": at(10, 0),
    "end": at(12, 0),
    "shifts": [{ "start": at(10, 0), "end": at(11, 0), "userID": alice }]
  });
  let (status, _) = send(store.clone(), "PUT", &uri, Some(window.clone())).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, body) = send(store, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!([window]));
}

#[tokio::test]
async fn get_unknown_schedule_is_empty_list() {
  let store = make_store().await;
  let uri = format!("/schedules/{}/temporary-schedules", Uuid::new_v4());
  let (status, body) = send(store, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!([]));
}

#[tokio::test]
async fn clear_splits_window() {
  let store = make_store().await;
  let uri = format!("/schedules/{}/temporary-schedules", Uuid::new_v4());

  let (status, _) = send(
    store.clone(),
    "PUT",
    &uri,
    Some(json!({ "start": at(10, 0), "end": at(11, 0), "shifts": [] })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(
    store.clone(),
    "POST",
    &format!("{uri}/clear"),
    Some(json!({ "start": at(10, 30), "end": at(10, 45) })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, body) = send(store, "GET", &uri, None).await;
  assert_eq!(body, json!([
    { "start": at(10, 0), "end": at(10, 30), "shifts": [] },
    { "start": at(10, 45), "end": at(11, 0), "shifts": [] },
  ]));
}

#[tokio::test]
async fn validation_errors_are_400_with_fields() {
  let store = make_store().await;
  let uri = format!("/schedules/{}/temporary-schedules", Uuid::new_v4());
  let user = Uuid::new_v4();

  let (status, body) = send(
    store,
    "PUT",
    &uri,
    Some(json!({
      "start": at(12, 0),
      "end": at(10, 0),
      "shifts": [{ "start": at(9, 0), "end": at(9, 30), "userID": user }]
    })),
  )
  .await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  let fields: Vec<&str> = body["fields"]
    .as_array()
    .unwrap()
    .iter()
    .map(|f| f["field"].as_str().unwrap())
    .collect();
  assert!(fields.contains(&"end"), "{body}");
  assert!(fields.contains(&"shifts[0].start"), "{body}");
}

#[tokio::test]
async fn malformed_schedule_id_is_rejected() {
  let store = make_store().await;
  let (status, body) = send(store, "GET", "/schedules/not-a-uuid/temporary-schedules", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body.as_str().is_some_and(|text| !text.is_empty()), "{body}");
}
