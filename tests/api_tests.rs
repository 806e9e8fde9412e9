use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use rainbow_notifications::{
    config::Config,
    models::{Notification, PushMessage, TokenSet},
    routes,
    services::{
        DeliveryGateway, GatewayError, MemoryStore, NotificationStore, StoreError, TokenStore,
    },
    state::AppState,
};

/// Fails delivery for the listed tokens, succeeds for everything else.
struct ScriptedGateway {
    failing: HashSet<String>,
}

impl ScriptedGateway {
    fn failing(tokens: &[&str]) -> Self {
        Self {
            failing: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait]
impl DeliveryGateway for ScriptedGateway {
    async fn send(&self, message: &PushMessage) -> Result<String, GatewayError> {
        if self.failing.contains(&message.token) {
            Err(GatewayError::Unregistered)
        } else {
            Ok(format!("projects/test/messages/{}", message.token))
        }
    }
}

fn app_with(config: Config, store: &MemoryStore, gateway: ScriptedGateway) -> Router {
    let state = AppState::new(
        config,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(gateway),
    );
    routes::app(Arc::new(state))
}

fn app(store: &MemoryStore) -> Router {
    app_with(Config::default(), store, ScriptedGateway::failing(&[]))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = app(&MemoryStore::new());
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn unknown_notification_is_404() {
    let app = app(&MemoryStore::new());
    let (status, body) = call(&app, "GET", "/unknown-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Notification not found"}));
}

#[tokio::test]
async fn create_then_get_round_trip() {
    let app = app(&MemoryStore::new());

    let (status, created) = call(
        &app,
        "POST",
        "/",
        Some(json!({"userId": "u1", "title": "Hello", "body": "World", "data": {"k": "v"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["isRead"], false);
    let id = created["notificationId"].as_str().unwrap().to_string();

    let (status, fetched) = call(&app, "GET", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_keeps_supplied_id() {
    let app = app(&MemoryStore::new());
    let (status, created) = call(
        &app,
        "POST",
        "/",
        Some(json!({"notificationId": "n-1", "userId": "u1", "title": "t", "body": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["notificationId"], "n-1");

    let (status, _) = call(&app, "GET", "/n-1", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_without_required_fields_is_400() {
    let app = app(&MemoryStore::new());
    let (status, body) = call(&app, "POST", "/", Some(json!({"userId": "u1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Missing required fields");
}

#[tokio::test]
async fn registering_a_token_twice_is_idempotent() {
    let store = MemoryStore::new();
    let app = app(&store);
    let request = json!({"userId": "u1", "token": "t1"});

    let (status, first) = call(&app, "POST", "/tokens", Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "success");

    let (status, second) = call(&app, "POST", "/tokens", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "success");

    let set = store.tokens_for("u1").await.unwrap().unwrap();
    assert_eq!(set.tokens, vec!["t1".to_string()]);
}

#[tokio::test]
async fn register_token_without_token_is_400() {
    let app = app(&MemoryStore::new());
    let (status, body) = call(&app, "POST", "/tokens", Some(json!({"userId": "u1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "Missing userId or token"}));
}

#[tokio::test]
async fn send_without_required_fields_is_400() {
    let app = app(&MemoryStore::new());
    let (status, body) = call(&app, "POST", "/send", Some(json!({"userId": "u1", "title": "t"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "Missing required fields"}));
}

#[tokio::test]
async fn send_reports_partial_failure() {
    let store = MemoryStore::new();
    store.add_token("u1", "tokA").await.unwrap();
    store.add_token("u1", "tokB").await.unwrap();
    let app = app_with(Config::default(), &store, ScriptedGateway::failing(&["tokB"]));

    let (status, body) = call(
        &app,
        "POST",
        "/send",
        Some(json!({"userId": "u1", "title": "Hello", "body": "World", "data": {"n": 1}})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["sent"], 1);
    assert_eq!(body["failed"], 1);

    let id = body["notificationId"].as_str().unwrap();
    let (status, stored) = call(&app, "GET", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["userId"], "u1");
    assert_eq!(stored["data"], json!({"n": 1}));
    assert_eq!(store.notification_count().await, 1);
}

#[tokio::test]
async fn send_without_tokens_writes_nothing() {
    let store = MemoryStore::new();
    let app = app(&store);

    let (status, body) = call(
        &app,
        "POST",
        "/send",
        Some(json!({"userId": "nobody", "title": "Hello", "body": "World"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "no_tokens");
    assert_eq!(body["sent"], 0);
    assert_eq!(body["failed"], 0);
    assert_eq!(store.notification_count().await, 0);
}

#[tokio::test]
async fn mark_read_flips_flag() {
    let app = app(&MemoryStore::new());
    let (_, created) = call(
        &app,
        "POST",
        "/",
        Some(json!({"notificationId": "n-2", "userId": "u1", "title": "t", "body": "b"})),
    )
    .await;
    assert_eq!(created["isRead"], false);

    let (status, updated) = call(&app, "POST", "/n-2/read", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isRead"], true);

    let (status, _) = call(&app, "POST", "/missing/read", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_prefix_nests_routes() {
    let config = Config {
        api_prefix: "/notifications".to_string(),
        ..Config::default()
    };
    let app = app_with(config, &MemoryStore::new(), ScriptedGateway::failing(&[]));

    let (status, body) = call(&app, "GET", "/notifications/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, created) = call(
        &app,
        "POST",
        "/notifications/",
        Some(json!({"notificationId": "n-3", "userId": "u1", "title": "t", "body": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["notificationId"], "n-3");

    let (status, _) = call(
        &app,
        "POST",
        "/notifications",
        Some(json!({"userId": "u1", "title": "t", "body": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, fetched) = call(&app, "GET", "/notifications/n-3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, _) = call(&app, "GET", "/n-3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn call_raw(app: &Router, uri: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn body_without_content_type_is_accepted() {
    let store = MemoryStore::new();
    let app = app(&store);

    let (status, body) = call_raw(&app, "/tokens", r#"{"userId": "u1", "token": "t1"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(store.tokens_for("u1").await.unwrap().unwrap().contains("t1"));
}

#[tokio::test]
async fn malformed_bodies_are_400_with_detail() {
    let app = app(&MemoryStore::new());

    for (uri, raw) in [
        ("/send", ""),
        ("/send", "{not json"),
        ("/send", r#"{"userId": 5, "title": "t", "body": "b"}"#),
        ("/", r#"{"userId": "u1", "title": "t", "body": "b", "data": [1, 2]}"#),
        ("/tokens", r#"["u1", "t1"]"#),
    ] {
        let (status, body) = call_raw(&app, uri, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, raw);
        assert!(body["detail"].as_str().unwrap().starts_with("Invalid JSON body"));
    }
}

struct UnavailableStore;

#[async_trait]
impl NotificationStore for UnavailableStore {
    async fn put(&self, _: &Notification) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn get(&self, _: &str) -> Result<Option<Notification>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn mark_read(&self, _: &str) -> Result<Option<Notification>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[async_trait]
impl TokenStore for UnavailableStore {
    async fn tokens_for(&self, _: &str) -> Result<Option<TokenSet>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn add_token(&self, _: &str, _: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn store_failures_surface_as_500() {
    let store = Arc::new(UnavailableStore);
    let state = AppState::new(
        Config::default(),
        store.clone(),
        store,
        Arc::new(ScriptedGateway::failing(&[])),
    );
    let app = routes::app(Arc::new(state));

    let (status, body) = call(&app, "GET", "/n-1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        "Error fetching notification: store unavailable: connection refused"
    );

    let (status, body) = call(
        &app,
        "POST",
        "/send",
        Some(json!({"userId": "u1", "title": "t", "body": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().starts_with("Error sending notification"));

    let (status, _) = call(&app, "POST", "/tokens", Some(json!({"userId": "u1", "token": "t"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
