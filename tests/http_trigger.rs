//! HTTP surface tests: webhook trigger, health, stats, metrics.
//!
//! Requests go straight into the router with `oneshot`; no listener needed.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use push_notification_dispatcher::config::{
    ApiConfig, FcmConfig, LogConfig, OtelConfig, RedisConfig, ServerConfig, Settings,
    TokenStoreConfig,
};
use push_notification_dispatcher::notification::{PushDispatcher, PushPayload};
use push_notification_dispatcher::push::{PushError, PushSender};
use push_notification_dispatcher::server::{create_app, AppState};
use push_notification_dispatcher::token_store::MemoryTokenStore;

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<PushPayload>>,
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(&self, payload: &PushPayload) -> Result<String, PushError> {
        self.sent.lock().unwrap().push(payload.clone());
        Ok("projects/demo-app/messages/0:1700000000000000%abc".to_string())
    }
}

fn test_settings(api_key: Option<&str>) -> Settings {
    Settings {
        server: ServerConfig::default(),
        api: ApiConfig {
            key: api_key.map(str::to_string),
        },
        redis: RedisConfig::default(),
        token_store: TokenStoreConfig {
            backend: "memory".to_string(),
            ..TokenStoreConfig::default()
        },
        fcm: FcmConfig {
            project_id: "demo-app".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
            service_account_path: None,
            access_token: Some("unused".to_string()),
            timeout_seconds: 1,
        },
        log: LogConfig::default(),
        otel: OtelConfig::default(),
    }
}

fn create_test_app(api_key: Option<&str>) -> (Router, Arc<MemoryTokenStore>, Arc<RecordingSender>) {
    let store = Arc::new(MemoryTokenStore::new());
    let sender = Arc::new(RecordingSender::default());
    let dispatcher = Arc::new(PushDispatcher::new(store.clone(), sender.clone()));
    let state = AppState::new(test_settings(api_key), dispatcher, "memory");

    (create_app(state), store, sender)
}

fn created_request(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_webhook_sends_push() {
    let (app, store, sender) = create_test_app(None);
    store.insert("user-42", "tok_abc");

    let response = app
        .oneshot(created_request(
            "/api/v1/notifications/user-42/-NotifA1",
            json!({
                "title": "Booking Confirmed",
                "body": "Your booking is set",
                "bookingId": "bk123",
                "isRead": false
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "sent", "receipt": "projects/demo-app/messages/0:1700000000000000%abc"})
    );

    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].token, "tok_abc");
    assert_eq!(sent[0].data.booking_id, "bk123");
}

#[tokio::test]
async fn test_webhook_already_read_is_ok() {
    let (app, store, sender) = create_test_app(None);
    store.insert("user-42", "tok_abc");

    let response = app
        .oneshot(created_request(
            "/api/v1/notifications/user-42/-NotifA1",
            json!({"title": "t", "body": "b", "isRead": true}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "no_op", "reason": "already_read"})
    );
    assert!(sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_no_token_is_ok() {
    let (app, _store, sender) = create_test_app(None);

    let response = app
        .oneshot(created_request(
            "/api/v1/notifications/user-without-device/n1",
            json!({"title": "t", "body": "b"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "no_op", "reason": "no_token"})
    );
    assert!(sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_rejects_malformed_body() {
    let (app, _store, sender) = create_test_app(None);

    let response = app
        .oneshot(created_request(
            "/api/v1/notifications/user-42/n1",
            json!({"title": 17, "isRead": "yes"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    assert!(sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_requires_api_key_when_configured() {
    let (app, store, _sender) = create_test_app(Some("s3cret"));
    store.insert("user-42", "tok_abc");

    let missing = app
        .clone()
        .oneshot(created_request(
            "/api/v1/notifications/user-42/n1",
            json!({"title": "t", "body": "b"}),
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let mut request = created_request(
        "/api/v1/notifications/user-42/n1",
        json!({"title": "t", "body": "b"}),
    );
    request
        .headers_mut()
        .insert("x-api-key", "s3cret".parse().unwrap());

    let authorized = app.oneshot(request).await.unwrap();
    assert_eq!(authorized.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _store, _sender) = create_test_app(None);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["token_store"], json!("memory"));
}

#[tokio::test]
async fn test_stats_reflect_dispatches() {
    let (app, store, _sender) = create_test_app(None);
    store.insert("user-42", "tok_abc");

    let response = app
        .clone()
        .oneshot(created_request(
            "/api/v1/notifications/user-42/n1",
            json!({"title": "t", "body": "b"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["dispatcher"]["total_dispatched"], json!(1));
    assert_eq!(body["dispatcher"]["total_sent"], json!(1));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _store, _sender) = create_test_app(None);

    app.clone()
        .oneshot(created_request(
            "/api/v1/notifications/user-42/n1",
            json!({"isRead": true}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("push_dispatcher_dispatch_total"));
}
