//! Integration tests for the WebSocket relay server.
//!
//! These tests verify the RelayServer works correctly as a complete system,
//! testing connection ids, routing, attribution, and graceful shutdown.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.
//! We test the panic-free behavior of production code through assertions.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use wschat_relay::registry::{spawn_registry, RegistryHandle};
use wschat_relay::RelayServer;

// ============================================================================
// Constants
// ============================================================================

/// How long to wait for a frame that should arrive
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait for a frame that should NOT arrive
const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Interval between registry polls
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Test Helpers
// ============================================================================

/// Test server context that manages server lifecycle.
struct TestServer {
    addr: SocketAddr,
    registry: RegistryHandle,
    cancel_token: CancellationToken,
}

impl TestServer {
    async fn spawn() -> Self {
        let registry = spawn_registry();
        let cancel_token = CancellationToken::new();

        let server = RelayServer::bind(
            "127.0.0.1:0".parse().unwrap(),
            registry.clone(),
            cancel_token.clone(),
        )
        .await
        .expect("bind relay");
        let addr = server.local_addr().expect("local addr");

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        Self {
            addr,
            registry,
            cancel_token,
        }
    }

    fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    async fn connect(&self) -> TestClient {
        let (ws, _response) = connect_async(self.url()).await.expect("connect to relay");
        TestClient { ws }
    }

    /// Waits until the registry holds exactly `expected` connections.
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
    async fn send(&mut self, value: Value) {
        self.ws
            .send(Message::text(value.to_string()))
            .await
            .expect("send frame");
    }

    async fn send_message(&mut self, text: &str) {
        self.send(json!({"action": "send_message", "data": text}))
            .await;
    }

    async fn recv(&mut self) -> Value {
        self.recv_timeout(RECV_TIMEOUT)
            .await
            .expect("expected a frame from the relay")
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

    /// Returns true once the relay has closed the stream.
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

    /// Sends one message and returns the sender's own id.
    async fn learn_identity(&mut self) -> String {
        self.send_message("hello").await;
        let identity = self.recv().await;
        let id = identity["connectionId"].as_str().expect("identity frame").to_string();
        let _echo = self.recv().await;
        id
    }
}

// ============================================================================
// Routing Tests
// ============================================================================

#[tokio::test]
async fn test_sender_gets_identity_then_broadcast() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    client.send_message("hi").await;

    let identity = client.recv().await;
    let id = identity["connectionId"].as_str().unwrap().to_string();
    assert!(id.starts_with("conn-"));
    assert!(identity.get("message").is_none());

    let broadcast = client.recv().await;
    assert_eq!(broadcast["from"], id.as_str());
    assert_eq!(broadcast["message"], "hi");
}

#[tokio::test]
async fn test_broadcast_reaches_other_clients_with_attribution() {
    let server = TestServer::spawn().await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    server.wait_for_connections(2).await;

    let alice_id = alice.learn_identity().await;
    // Bob sees Alice's first message but no identity frame.
    let seen = bob.recv().await;
    assert_eq!(seen["from"], alice_id.as_str());
    assert!(seen.get("connectionId").is_none());

    bob.send_message("hey alice").await;
    let bob_identity = bob.recv().await;
    let bob_id = bob_identity["connectionId"].as_str().unwrap().to_string();
    assert_ne!(bob_id, alice_id);

    let at_alice = alice.recv().await;
    assert_eq!(at_alice["from"], bob_id.as_str());
    assert_eq!(at_alice["message"], "hey alice");
    assert!(alice.recv_timeout(QUIET_PERIOD).await.is_none());
}

#[tokio::test]
async fn test_connection_ids_are_unique() {
    let server = TestServer::spawn().await;
    let mut first = server.connect().await;
    let mut second = server.connect().await;
    server.wait_for_connections(2).await;

    let first_id = first.learn_identity().await;
    let _ = second.recv().await;
    let second_id = second.learn_identity().await;

    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_missing_data_uses_placeholder() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    client.send(json!({"action": "send_message"})).await;
    let _identity = client.recv().await;
    let broadcast = client.recv().await;

    assert_eq!(broadcast["message"], "(empty message)");
}

#[tokio::test]
async fn test_unrouted_action_gets_no_reply() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    client.send(json!({"action": "join_room", "data": "x"})).await;
    client.send(json!({"data": "no action at all"})).await;
    assert!(client.recv_timeout(QUIET_PERIOD).await.is_none());

    // The connection stays usable.
    client.send_message("after").await;
    let _identity = client.recv().await;
    assert_eq!(client.recv().await["message"], "after");
}

#[tokio::test]
async fn test_whitespace_is_relayed_verbatim() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    client.send_message("  spaced out  ").await;
    let _identity = client.recv().await;
    assert_eq!(client.recv().await["message"], "  spaced out  ");
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_close_unregisters_connection() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;
    server.wait_for_connections(1).await;

    client.ws.close(None).await.unwrap();
    server.wait_for_connections(0).await;
}

#[tokio::test]
async fn test_closed_client_misses_later_broadcasts() {
    let server = TestServer::spawn().await;
    let mut leaver = server.connect().await;
    let mut stayer = server.connect().await;
    server.wait_for_connections(2).await;

    leaver.ws.close(None).await.unwrap();
    server.wait_for_connections(1).await;

    stayer.send_message("anyone left?").await;
    let _identity = stayer.recv().await;
    assert_eq!(stayer.recv().await["message"], "anyone left?");
}

#[tokio::test]
async fn test_shutdown_closes_clients() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;
    server.wait_for_connections(1).await;

    server.cancel_token.cancel();

    assert!(client.is_closed_by_relay().await);
}
