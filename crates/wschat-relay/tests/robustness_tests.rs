//! Robustness tests for the relay.
//!
//! These tests verify the relay handles edge cases and error conditions gracefully:
//! - Malformed frames
//! - Message size limits
//! - Rapid connect/disconnect
//! - Idle connections
//! - Capacity limits
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use wschat_relay::registry::{spawn_registry, spawn_registry_with_capacity, RegistryHandle};
use wschat_relay::server::MAX_MESSAGE_SIZE;
use wschat_relay::RelayServer;

// ============================================================================
// Constants
// ============================================================================

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(200);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Test Helpers
// ============================================================================

struct TestServer {
    addr: SocketAddr,
    registry: RegistryHandle,
    cancel_token: CancellationToken,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(spawn_registry(), None).await
    }

    async fn spawn_with(registry: RegistryHandle, idle_timeout: Option<Duration>) -> Self {
        let cancel_token = CancellationToken::new();

        let mut server = RelayServer::bind(
            "127.0.0.1:0".parse().unwrap(),
            registry.clone(),
            cancel_token.clone(),
        )
        .await
        .expect("bind relay");
        if let Some(idle) = idle_timeout {
            server = server.with_idle_timeout(idle);
        }
        let addr = server.local_addr().unwrap();

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        TestServer {
            addr,
            registry,
            cancel_token,
        }
    }

    async fn connect(&self) -> TestClient {
        let (ws, _) = connect_async(format!("ws://{}", self.addr))
            .await
            .expect("connect to relay");
        TestClient { ws }
    }

    async fn wait_for_connections(&self, expected: usize) {
        let result = timeout(RECV_TIMEOUT, async {
            while self.registry.connection_count().await != expected {
                sleep(POLL_INTERVAL).await;
            }
        })
        .await;
        assert!(result.is_ok(), "registry never reached {expected} connections");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn send_raw(&mut self, text: impl Into<String>) {
        self.ws
            .send(Message::text(text.into()))
            .await
            .expect("send frame");
    }

    async fn send_message(&mut self, text: &str) {
        self.send_raw(json!({"action": "send_message", "data": text}).to_string())
            .await;
    }

    async fn recv_timeout(&mut self, duration: Duration) -> Option<Value> {
        let result = timeout(duration, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return serde_json::from_str::<Value>(text.as_str()).ok();
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    _ => return None,
                }
            }
        })
        .await;
        result.ok().flatten()
    }

    async fn recv(&mut self) -> Value {
        self.recv_timeout(RECV_TIMEOUT)
            .await
            .expect("expected a frame from the relay")
    }

    /// Sends a message and checks the relay still answers.
    async fn assert_still_served(&mut self, text: &str) {
        self.send_message(text).await;
        let identity = self.recv().await;
        assert!(identity["connectionId"].is_string());
        assert_eq!(self.recv().await["message"], text);
    }

    async fn is_closed_by_relay(&mut self) -> bool {
        let result = timeout(RECV_TIMEOUT, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        result.unwrap_or(false)
    }
}

// ============================================================================
// Malformed Frame Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_json_handled_gracefully() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    client.send_raw("{not valid json").await;
    assert!(client.recv_timeout(QUIET_PERIOD).await.is_none());

    client.assert_still_served("recovered").await;
}

#[tokio::test]
async fn test_non_object_json_handled() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    for raw in ["[]", "42", "\"send_message\"", "null"] {
        client.send_raw(raw).await;
    }
    assert!(client.recv_timeout(QUIET_PERIOD).await.is_none());

    client.assert_still_served("still here").await;
}

#[tokio::test]
async fn test_empty_frame_handled() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    client.send_raw("").await;
    client.assert_still_served("after empty").await;
}

#[tokio::test]
async fn test_binary_frame_ignored() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    client
        .ws
        .send(Message::binary(vec![0u8, 159, 146, 150]))
        .await
        .unwrap();
    assert!(client.recv_timeout(QUIET_PERIOD).await.is_none());

    client.assert_still_served("text works").await;
}

#[tokio::test]
async fn test_non_string_data_is_relayed_as_json_text() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    client
        .send_raw(json!({"action": "send_message", "data": {"n": 1}}).to_string())
        .await;
    let _identity = client.recv().await;
    assert_eq!(client.recv().await["message"], r#"{"n":1}"#);
}

// ============================================================================
// Size Limit Tests
// ============================================================================

#[tokio::test]
async fn test_oversized_message_dropped() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    let huge = "x".repeat(MAX_MESSAGE_SIZE + 1);
    client.send_message(&huge).await;
    assert!(client.recv_timeout(QUIET_PERIOD).await.is_none());

    client.assert_still_served("small again").await;
}

// ============================================================================
// Connection Churn Tests
// ============================================================================

#[tokio::test]
async fn test_rapid_connect_disconnect() {
    let server = TestServer::spawn().await;

    for _ in 0..20 {
        let mut client = server.connect().await;
        client.ws.close(None).await.unwrap();
    }

    server.wait_for_connections(0).await;

    let mut client = server.connect().await;
    client.assert_still_served("survived churn").await;
}

#[tokio::test]
async fn test_many_concurrent_connections() {
    let server = TestServer::spawn().await;
    let mut clients = Vec::new();
    for _ in 0..25 {
        clients.push(server.connect().await);
    }
    server.wait_for_connections(25).await;

    let (first, rest) = clients.split_first_mut().unwrap();
    first.send_message("to everyone").await;
    let _identity = first.recv().await;
    assert_eq!(first.recv().await["message"], "to everyone");

    for client in rest {
        assert_eq!(client.recv().await["message"], "to everyone");
    }
}

#[tokio::test]
async fn test_dropped_socket_is_unregistered() {
    let server = TestServer::spawn().await;
    let client = server.connect().await;
    server.wait_for_connections(1).await;

    drop(client);
    server.wait_for_connections(0).await;
}

// ============================================================================
// Limits Tests
// ============================================================================

#[tokio::test]
async fn test_idle_connection_closed() {
    let server = TestServer::spawn_with(spawn_registry(), Some(Duration::from_millis(200))).await;
    let mut client = server.connect().await;
    server.wait_for_connections(1).await;

    assert!(client.is_closed_by_relay().await);
    server.wait_for_connections(0).await;
}

#[tokio::test]
async fn test_registry_full_rejects_connection() {
    let server = TestServer::spawn_with(spawn_registry_with_capacity(1), None).await;
    let mut first = server.connect().await;
    server.wait_for_connections(1).await;

    let mut second = server.connect().await;
    assert!(second.is_closed_by_relay().await);

    first.assert_still_served("only one").await;
}
