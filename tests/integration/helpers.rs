//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use gamerent_api::{AppState, build_app, build_state_with_store};
use gamerent_core::config::AppConfig;
use gamerent_database::MemoryDocumentStore;

/// WebSocket client stream used by the real-time tests.
pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration with cheap hashing, a short logout grace and no periodic
/// notifications.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.token_secret = Some("integration-test-secret".to_string());
    config.auth.hashing.time_cost = 1;
    config.auth.hashing.memory_kib = 64;
    config.auth.hashing.parallelism = 1;
    config.realtime.logout_grace_ms = 50;
    config.realtime.handshake_timeout_seconds = 2;
    config.realtime.notifications.enabled = false;
    config
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for inspecting the registry directly
    pub state: AppState,
}

/// Response captured from the router.
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Parsed JSON body, or `Null` when empty.
    pub body: Value,
}

impl TestApp {
    /// Create a new test application over an in-memory store
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a test application with a custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        let state = build_state_with_store(config, Arc::new(MemoryDocumentStore::new()))
            .expect("Failed to build state");
        let router = build_app(state.clone());
        Self { router, state }
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Register an account and return its token
    pub async fn register(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/register",
                Some(serde_json::json!({ "username": username, "password": password })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Register failed: {:?}",
            response.body
        );

        token_of(&response)
    }

    /// Serve the app on an ephemeral port and return its address
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });
        addr
    }

    /// Wait until the registry holds exactly `expected` connections
    pub async fn wait_for_connections(&self, expected: usize) {
        let registry = &self.state.realtime.registry;
        let waited = tokio::time::timeout(RECV_TIMEOUT, async {
            while registry.connection_count().await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "Expected {expected} connections, have {}",
            registry.connection_count().await
        );
    }
}

/// Token field of an auth response
pub fn token_of(response: &TestResponse) -> String {
    response
        .body
        .get("token")
        .and_then(|v| v.as_str())
        .expect("No token in response")
        .to_string()
}

/// Open a WebSocket to a spawned app
pub async fn ws_connect(addr: SocketAddr) -> WsClient {
    let (client, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("WebSocket connect failed");
    client
}

/// Open a WebSocket and complete the authorization handshake
pub async fn ws_authorized(app: &TestApp, addr: SocketAddr, token: &str) -> WsClient {
    let before = app.state.realtime.registry.connection_count().await;
    let mut client = ws_connect(addr).await;
    send_json(
        &mut client,
        serde_json::json!({ "type": "authorization", "payload": token }),
    )
    .await;
    app.wait_for_connections(before + 1).await;
    client
}

/// Send a JSON envelope as a text frame
pub async fn send_json(client: &mut WsClient, value: Value) {
    client
        .send(WsMessage::text(value.to_string()))
        .await
        .expect("WebSocket send failed");
}

/// Next frame from the server, skipping pings
pub async fn recv_frame(client: &mut WsClient) -> Option<WsMessage> {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("Timed out waiting for a frame");
        match frame {
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => continue,
            Some(Ok(frame)) => return Some(frame),
            Some(Err(_)) | None => return None,
        }
    }
}

/// Next text frame parsed as JSON
pub async fn recv_json(client: &mut WsClient) -> Value {
    match recv_frame(client).await {
        Some(WsMessage::Text(text)) => {
            serde_json::from_str(text.as_str()).expect("Server sent invalid JSON")
        }
        other => panic!("Expected a text frame, got {other:?}"),
    }
}

/// Next frame, which must be a close frame; returns its code and reason
pub async fn recv_close(client: &mut WsClient) -> (u16, String) {
    match recv_frame(client).await {
        Some(WsMessage::Close(Some(frame))) => (u16::from(frame.code), frame.reason.to_string()),
        other => panic!("Expected a close frame, got {other:?}"),
    }
}
