//! Router tests: webhook authentication, dispatch and service endpoints

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use intake_bot_agent::{Capabilities, EngineConfig};
use intake_bot_core::{
    Attachment, CapabilityError, DialogueState, Field, Reply, SessionStore, Transport, UserId,
};
use intake_bot_persistence::{
    InMemoryBlobStore, InMemoryLocalePreferences, InMemorySessionStore, InMemoryTableStore,
    JsonLocaleCatalog,
};
use intake_bot_server::{build_dispatcher, create_router, AppState};
use intake_bot_transport::TelegramClient;

const WEBHOOK_PATH: &str = "/telegram/webhook";
const SECRET: &str = "hook-secret";

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(UserId, Reply)>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, to: &UserId, reply: Reply) -> Result<(), CapabilityError> {
        self.sent.lock().push((to.clone(), reply));
        Ok(())
    }

    async fn fetch_attachment(&self, _a: &Attachment) -> Result<Vec<u8>, CapabilityError> {
        Ok(Vec::new())
    }

    async fn send_file(
        &self,
        _to: &UserId,
        _file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<(), CapabilityError> {
        Ok(())
    }
}

struct Harness {
    app: Router,
    transport: Arc<RecordingTransport>,
    sessions: Arc<InMemorySessionStore>,
}

fn harness(secret: Option<&str>) -> Harness {
    let transport = Arc::new(RecordingTransport::default());
    let sessions = Arc::new(InMemorySessionStore::new());
    let catalog = JsonLocaleCatalog::embedded(
        "en",
        vec!["ru".into(), "uk".into(), "pl".into(), "en".into()],
    )
    .unwrap();

    let caps = Capabilities {
        transport: transport.clone(),
        sessions: sessions.clone(),
        blobs: Arc::new(InMemoryBlobStore::new()),
        tables: Arc::new(InMemoryTableStore::new()),
        localizer: Arc::new(catalog),
        locale_prefs: Arc::new(InMemoryLocalePreferences::new()),
    };
    let dispatcher = Arc::new(build_dispatcher(
        caps,
        EngineConfig::default().with_settle(Duration::ZERO),
    ));
    // only used to answer callback queries, which these tests do not send
    let telegram = Arc::new(TelegramClient::new("http://127.0.0.1:9", "test-token"));

    let state = AppState::new(dispatcher, telegram).with_webhook_secret(secret.map(String::from));
    Harness {
        app: create_router(state, WEBHOOK_PATH),
        transport,
        sessions,
    }
}

fn start_update() -> String {
    serde_json::json!({
        "update_id": 1001,
        "message": {
            "message_id": 1,
            "chat": {"id": 555, "type": "private"},
            "from": {"id": 555, "is_bot": false, "first_name": "Ivan", "language_code": "ru"},
            "text": "/start"
        }
    })
    .to_string()
}

fn webhook_request(body: String, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-telegram-bot-api-secret-token", secret);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn wait_for_replies(transport: &RecordingTransport, count: usize) {
    for _ in 0..100 {
        if transport.sent.lock().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {count} replies");
}

#[tokio::test]
async fn test_webhook_dispatches_update() {
    let h = harness(Some(SECRET));

    let response = h
        .app
        .clone()
        .oneshot(webhook_request(start_update(), Some(SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ok"], true);

    wait_for_replies(&h.transport, 1).await;
    let session = h
        .sessions
        .load(&UserId::from(555))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.state, DialogueState::AwaitingName);
    assert_eq!(session.field(Field::Locale), Some("ru"));
}

#[tokio::test]
async fn test_webhook_rejects_wrong_secret() {
    let h = harness(Some(SECRET));

    let response = h
        .app
        .clone()
        .oneshot(webhook_request(start_update(), Some("guess")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = h
        .app
        .oneshot(webhook_request(start_update(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.transport.sent.lock().is_empty());
}

#[tokio::test]
async fn test_webhook_without_secret_accepts_any() {
    let h = harness(None);

    let response = h
        .app
        .oneshot(webhook_request(start_update(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_replies(&h.transport, 1).await;
}

#[tokio::test]
async fn test_webhook_rejects_malformed_body() {
    let h = harness(None);

    let response = h
        .app
        .oneshot(webhook_request("{\"not\": \"an update\"}".into(), None))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_update_without_event_is_acknowledged() {
    let h = harness(None);
    let body = serde_json::json!({ "update_id": 7 }).to_string();

    let response = h.app.oneshot(webhook_request(body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.transport.sent.lock().is_empty());
}

#[tokio::test]
async fn test_health() {
    let h = harness(None);

    let response = h
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["active_users"], 0);
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let h = harness(None);

    let response = h
        .app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
