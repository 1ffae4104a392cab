//! End-to-end tests of the `/v1` router against an in-memory store.

use std::{path::PathBuf, sync::Arc};

use ashiato_store_sqlite::SqliteStore;
use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{AppState, ServerConfig, router};

fn config() -> ServerConfig {
  ServerConfig {
    host:               "127.0.0.1".to_string(),
    port:               0,
    store_path:         PathBuf::from(":memory:"),
    jwt_secret:         "test-secret".to_string(),
    token_ttl_hours:    1,
    max_drift_meters:   5000.0,
    storage_timeout_ms: 5000,
  }
}

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  router(AppState::new(Arc::new(store), &config()))
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(body) => req
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string())),
    None => req.body(Body::empty()),
  }
  .unwrap();

  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

/// Register `name` and return `(user_id, token)`.
async fn register(app: &Router, name: &str) -> (String, String) {
  let (status, body) = send(
    app,
    Method::POST,
    "/v1/auth/register",
    None,
    Some(json!({
      "username": name,
      "email": format!("{name}@example.com"),
      "password": "hunter2hunter2",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  (
    body["user"]["user_id"].as_str().unwrap().to_string(),
    body["token"].as_str().unwrap().to_string(),
  )
}

const TOKYO_VIEWPORT: &str = "/v1/pins?sw_lat=35&sw_lng=139&ne_lat=36&ne_lng=140";

#[tokio::test]
async fn register_login_and_me() {
  let app = app().await;
  let (id, _) = register(&app, "hanako").await;

  let (status, _) = send(
    &app,
    Method::POST,
    "/v1/auth/register",
    None,
    Some(json!({ "username": "hanako", "email": "other@example.com", "password": "hunter2hunter2" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = send(
    &app,
    Method::POST,
    "/v1/auth/login",
    None,
    Some(json!({ "email": "hanako@example.com", "password": "wrong password" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = send(
    &app,
    Method::POST,
    "/v1/auth/login",
    None,
    Some(json!({ "email": "HANAKO@example.com", "password": "hunter2hunter2" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let token = body["token"].as_str().unwrap().to_string();

  let (status, me) = send(&app, Method::GET, "/v1/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["user_id"], json!(id));
  assert_eq!(me["username"], "hanako");
  assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn protected_routes_need_a_token() {
  let app = app().await;
  for uri in ["/v1/me", "/v1/friends", TOKYO_VIEWPORT] {
    let (status, body) = send(&app, Method::GET, uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    assert_eq!(body["error"], "unauthorized");
  }
}

#[tokio::test]
async fn posting_and_the_location_gate() {
  let app = app().await;
  let (_, token) = register(&app, "taro").await;

  let (status, pin) = send(
    &app,
    Method::POST,
    "/v1/pins",
    Some(&token),
    Some(json!({ "latitude": 35.681, "longitude": 139.767, "content_text": "station" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(pin["privacy_setting"], "public");
  assert_eq!(pin["status"], "active");

  let (status, body) = send(
    &app,
    Method::POST,
    "/v1/pins",
    Some(&token),
    Some(json!({ "latitude": 34.693, "longitude": 135.502, "content_text": "castle" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert!(body["error"].as_str().unwrap().contains("location deviation"));

  let (status, _) = send(
    &app,
    Method::POST,
    "/v1/pins",
    Some(&token),
    Some(json!({ "latitude": 95.0, "longitude": 139.767 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(&app, Method::GET, TOKYO_VIEWPORT, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["pins"].as_array().unwrap().len(), 1);
  assert_eq!(body["pins"][0]["pin_id"], pin["pin_id"]);

  let uri = format!("/v1/pins/{}", pin["pin_id"].as_str().unwrap());
  let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, body) = send(&app, Method::GET, TOKYO_VIEWPORT, Some(&token), None).await;
  assert!(body["pins"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn inverted_viewport_is_a_bad_request() {
  let app = app().await;
  let (_, token) = register(&app, "jiro").await;
  let (status, _) = send(
    &app,
    Method::GET,
    "/v1/pins?sw_lat=36&sw_lng=139&ne_lat=35&ne_lng=140",
    Some(&token),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn friendship_unlocks_friends_pins() {
  let app = app().await;
  let (author_id, author) = register(&app, "author").await;
  let (viewer_id, viewer) = register(&app, "viewer").await;

  let (status, _) = send(
    &app,
    Method::POST,
    "/v1/pins",
    Some(&author),
    Some(json!({
      "latitude": 35.681,
      "longitude": 139.767,
      "content_text": "friends only",
      "privacy_setting": "friends",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let friends_viewport = format!("{TOKYO_VIEWPORT}&privacy=friends");
  let (_, body) = send(&app, Method::GET, &friends_viewport, Some(&viewer), None).await;
  assert!(body["pins"].as_array().unwrap().is_empty());

  let (status, _) = send(&app, Method::GET, &format!("/v1/friends/{author_id}"), Some(&viewer), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, f) = send(
    &app,
    Method::POST,
    &format!("/v1/friends/{author_id}/request"),
    Some(&viewer),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(f["status"], "pending");

  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/v1/friends/{viewer_id}/request"),
    Some(&author),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, f) = send(
    &app,
    Method::POST,
    &format!("/v1/friends/{viewer_id}/accept"),
    Some(&author),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(f["status"], "accepted");

  let (_, body) = send(&app, Method::GET, &friends_viewport, Some(&viewer), None).await;
  assert_eq!(body["pins"].as_array().unwrap().len(), 1);

  let (_, body) = send(&app, Method::GET, "/v1/friends", Some(&viewer), None).await;
  assert_eq!(body["friends"], json!([author_id]));
}

#[tokio::test]
async fn self_request_is_a_bad_request() {
  let app = app().await;
  let (id, token) = register(&app, "solo").await;
  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/v1/friends/{id}/request"),
    Some(&token),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comments_follow_pin_visibility() {
  let app = app().await;
  let (_, author) = register(&app, "poster").await;
  let (_, stranger) = register(&app, "passerby").await;

  let (_, pin) = send(
    &app,
    Method::POST,
    "/v1/pins",
    Some(&author),
    Some(json!({
      "latitude": 35.681,
      "longitude": 139.767,
      "content_text": "friends only",
      "privacy_setting": "friends",
    })),
  )
  .await;
  let comments_uri = format!("/v1/pins/{}/comments", pin["pin_id"].as_str().unwrap());

  let (status, _) = send(
    &app,
    Method::POST,
    &comments_uri,
    Some(&stranger),
    Some(json!({ "content_text": "hello?" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(
    &app,
    Method::POST,
    &comments_uri,
    Some(&author),
    Some(json!({ "content_text": "   " })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, comment) = send(
    &app,
    Method::POST,
    &comments_uri,
    Some(&author),
    Some(json!({ "content_text": "note to self" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(comment["content_text"], "note to self");

  let (status, body) = send(&app, Method::GET, &comments_uri, Some(&author), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["comments"], json!([comment]));

  let (status, _) = send(&app, Method::GET, &comments_uri, Some(&stranger), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
