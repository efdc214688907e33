//! Common test utilities for inbox-hook integration tests
//!
//! Routers here run the real intake pipeline. Every observable outcome is
//! captured by a shared [`MemorySink`].

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use inbox_hook_api::{
    create_router, AppState, ProviderConfig, ProviderRegistry, ProviderSecretConfig,
    ServiceConfig, ServiceMetrics,
};
use inbox_hook_core::{encode_payload, signature::compute_signature, MemorySink};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

pub const SIGNATURE_HEADER: &str = "X-Nylas-Signature";

/// A router wired to a capturing sink.
pub struct TestService {
    pub app: Router,
    pub sink: Arc<MemorySink>,
    pub metrics: Arc<ServiceMetrics>,
}

impl TestService {
    /// Build a service with the given provider configurations.
    pub fn with_providers(providers: Vec<ProviderConfig>) -> Self {
        let sink = Arc::new(MemorySink::new());
        let config = ServiceConfig {
            providers,
            ..Default::default()
        };
        let registry = ProviderRegistry::from_config(&config, sink.clone()).unwrap();
        let metrics = ServiceMetrics::new().unwrap();
        let app = create_router(AppState::new(config, registry, metrics.clone()));

        Self { app, sink, metrics }
    }

    /// Provider `nylas` holding [`TEST_SECRET`].
    pub fn signed() -> Self {
        Self::with_providers(vec![nylas_provider(Some(TEST_SECRET), false)])
    }

    /// Provider `nylas` with no secret configured.
    pub fn unsigned() -> Self {
        Self::with_providers(vec![nylas_provider(None, false)])
    }

    /// Send one request and collect the status and body text.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }
}

pub fn nylas_provider(secret: Option<&str>, require_signature: bool) -> ProviderConfig {
    ProviderConfig {
        id: "nylas".to_string(),
        signature_header: None,
        require_signature,
        secret: secret.map(|value| ProviderSecretConfig::Literal {
            value: value.to_string(),
        }),
    }
}

/// Lowercase hex HMAC-SHA256 of `body` under [`TEST_SECRET`].
pub fn sign(body: &str) -> String {
    compute_signature(TEST_SECRET.as_bytes(), body.as_bytes()).unwrap()
}

pub fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook/nylas")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// A push delivery wrapping `payload` the way the relay does.
pub fn push_request(payload: &str) -> Request<Body> {
    let body = serde_json::json!({
        "message": {
            "data": encode_payload(payload.as_bytes()),
            "messageId": "1234567890",
            "publishTime": "2023-09-22T20:39:45Z",
            "attributes": {}
        },
        "subscription": "projects/demo/subscriptions/inbox-hook"
    });
    raw_push_request(&body.to_string())
}

pub fn raw_push_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/pubsub/nylas")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Notification fixtures
// ============================================================================

pub fn message_created() -> String {
    serde_json::json!({
        "specversion": "1.0",
        "type": "message.created",
        "source": "/google/emails/realtime",
        "id": "notif-100",
        "time": 1695415185,
        "webhook_delivery_attempt": 1,
        "data": {
            "application_id": "app-1",
            "grant_id": "grant-1",
            "object": {
                "id": "msg-1",
                "subject": "Quarterly numbers",
                "from": [{"name": "Ada", "email": "ada@example.com"}],
                "to": [{"email": "bob@example.com"}],
                "date": 1695415185
            }
        }
    })
    .to_string()
}

pub fn event_created() -> String {
    serde_json::json!({
        "specversion": "1.0",
        "type": "event.created",
        "id": "notif-200",
        "time": 1695415185,
        "data": {
            "grant_id": "grant-1",
            "object": {
                "title": "Planning",
                "calendar_id": "primary",
                "when": {"start_time": 1695415185, "end_time": 1695418785},
                "participants": [{"email": "a@example.com"}, {"email": "b@example.com"}]
            }
        }
    })
    .to_string()
}

pub fn notification_of_type(category: &str) -> String {
    serde_json::json!({
        "type": category,
        "id": "notif-300",
        "data": {"object": {"id": "obj-1"}}
    })
    .to_string()
}
