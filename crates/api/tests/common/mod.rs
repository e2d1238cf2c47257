#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tipline_api::config::ServerConfig;
use tipline_api::router::build_app_router;
use tipline_api::state::AppState;
use tipline_core::checkout::{CheckoutGateway, CheckoutSession, SessionRequest};
use tipline_core::error::SessionCreationError;
use tipline_core::signature::{sign_payload, SIGNATURE_HEADER};
use tipline_events::SubscriberRegistry;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const PUBLIC_ORIGIN: &str = "https://donate.example";
pub const CORS_ORIGIN: &str = "http://localhost:5173";
pub const SESSION_URL: &str = "https://checkout.example/c/pay/cs_test_1";

/// Build a test `ServerConfig` through the same loader production uses.
pub fn test_config() -> ServerConfig {
    config_from(&[
        ("STRIPE_SECRET", "sk_test_123"),
        ("STRIPE_WEBHOOK_SECRET", WEBHOOK_SECRET),
        ("PUBLIC_ORIGIN", PUBLIC_ORIGIN),
        ("CORS_ORIGIN", CORS_ORIGIN),
    ])
}

pub fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ServerConfig::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("test config is valid")
}

// ---------------------------------------------------------------------------
// MockGateway
// ---------------------------------------------------------------------------

/// In-memory processor that records every session request.
#[derive(Default)]
pub struct MockGateway {
    requests: Mutex<Vec<SessionRequest>>,
    fail: bool,
    delay: Option<Duration>,
}

impl MockGateway {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// A processor that takes `delay` to answer.
    pub fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<SessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckoutGateway for MockGateway {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, SessionCreationError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SessionCreationError::Rejected {
                status: 402,
                body: "Your card was declined.".into(),
            });
        }
        Ok(CheckoutSession {
            id: "cs_test_1".into(),
            url: SESSION_URL.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// TestApp
// ---------------------------------------------------------------------------

/// The full router plus handles on the state it was built with.
pub struct TestApp {
    pub router: Router,
    pub registry: Arc<SubscriberRegistry>,
    pub gateway: Arc<MockGateway>,
}

impl TestApp {
    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: impl Into<Body>) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        self.request(request).await
    }

    /// POST a webhook signed with [`WEBHOOK_SECRET`] at the current time.
    pub async fn post_signed_webhook(&self, body: &str) -> Response<Body> {
        let header = sign_payload(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), body.as_bytes());
        self.post_webhook(body, Some(&header)).await
    }

    pub async fn post_webhook(&self, body: &str, signature: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/webhook")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

/// Build the full application router with all middleware layers and a
/// recording gateway.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config(), MockGateway::default())
}

pub fn build_test_app_with(config: ServerConfig, gateway: MockGateway) -> TestApp {
    let registry = Arc::new(SubscriberRegistry::new());
    let gateway = Arc::new(gateway);
    let state = AppState::new(
        config.clone(),
        Arc::clone(&registry),
        Arc::clone(&gateway) as Arc<dyn CheckoutGateway>,
    );

    TestApp {
        router: build_app_router(state, &config),
        registry,
        gateway,
    }
}

// ---------------------------------------------------------------------------
// Body helpers
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// A `checkout.session.completed` event body carrying `metadata`.
pub fn completed_event(metadata: Value) -> String {
    serde_json::json!({
        "id": "evt_test_1",
        "object": "event",
        "type": "checkout.session.completed",
        "created": 1_700_000_000,
        "data": {
            "object": {
                "id": "cs_test_1",
                "object": "checkout.session",
                "metadata": metadata
            }
        }
    })
    .to_string()
}
