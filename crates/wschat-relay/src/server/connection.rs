//! Connection handler for individual WebSocket clients.
//!
//! Each accepted TCP stream gets its own `ConnectionHandler` that:
//! - Performs the WebSocket upgrade
//! - Registers the connection under its server-assigned id
//! - Routes incoming requests by their `action` field
//! - Drains the connection's outbound queue onto the socket
//! - Unregisters the connection when it closes
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Connection errors are logged and result in graceful disconnect

use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{accept_async, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wschat_core::ConnectionId;
use wschat_protocol::{parse_request, ProtocolError, RelayRequest, ServerFrame};

use crate::registry::{RegistryError, RegistryHandle};

/// Maximum inbound text frame size (128 KiB)
pub const MAX_MESSAGE_SIZE: usize = 128 * 1024;

/// Connections with no inbound traffic for this long are closed (10 minutes)
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Time allowed for the WebSocket upgrade
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Write timeout (10 seconds)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Frames buffered per connection before deliveries start failing
const OUTBOUND_BUFFER: usize = 64;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Why the read loop ended.
enum Exit {
    /// Peer closed or the stream ended.
    Closed,
    /// Relay is shutting down.
    Shutdown,
}

/// Connection handler for a single client.
pub struct ConnectionHandler {
    connection_id: ConnectionId,
    registry: RegistryHandle,
    cancel_token: CancellationToken,
    idle_timeout: Duration,
}

impl ConnectionHandler {
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `connection_id` - Server-assigned id for this connection
    /// * `registry` - Handle to the connection registry
    /// * `cancel_token` - Token for relay shutdown
    pub fn new(
        connection_id: ConnectionId,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            connection_id,
            registry,
            cancel_token,
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    /// Overrides the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Returns the connection id.
    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// Runs the connection handler until the connection closes.
    ///
    /// The connection is unregistered on every exit path after a successful
    /// registration.
    pub async fn run(self, stream: TcpStream) -> Result<(), ConnectionError> {
        let ws = match timeout(HANDSHAKE_TIMEOUT, accept_async(stream)).await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => return Err(ConnectionError::Handshake(e.to_string())),
            Err(_) => return Err(ConnectionError::HandshakeTimeout),
        };

        let (outbox, inbox) = mpsc::channel(OUTBOUND_BUFFER);
        let (mut write, read) = ws.split();

        if let Err(e) = self.registry.register(self.connection_id.clone(), outbox).await {
            warn!(connection_id = %self.connection_id, error = %e, "Rejecting connection");
            let _ = timeout(WRITE_TIMEOUT, write.close()).await;
            return Err(e.into());
        }

        info!(connection_id = %self.connection_id, "Client connected");

        let result = self.process(write, read, inbox).await;

        match self.registry.unregister(self.connection_id.clone()).await {
            Ok(()) | Err(RegistryError::ConnectionNotFound(_)) => {}
            Err(e) => {
                debug!(connection_id = %self.connection_id, error = %e, "Unregister failed");
            }
        }

        info!(connection_id = %self.connection_id, "Client disconnected");
        result
    }

    /// Main loop: inbound frames, outbound queue, idle timer, shutdown.
    async fn process(
        &self,
        mut write: WsSink,
        mut read: futures::stream::SplitStream<WebSocketStream<TcpStream>>,
        mut inbox: mpsc::Receiver<String>,
    ) -> Result<(), ConnectionError> {
        let mut deadline = Instant::now() + self.idle_timeout;

        let exit = loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => break Exit::Shutdown,

                _ = sleep_until(deadline) => {
                    warn!(connection_id = %self.connection_id, "Idle timeout, closing");
                    let _ = timeout(WRITE_TIMEOUT, write.close()).await;
                    return Err(ConnectionError::IdleTimeout);
                }

                outbound = inbox.recv() => {
                    match outbound {
                        Some(json) => send_text(&mut write, json).await?,
                        // The registry dropped our queue; nothing more will arrive.
                        None => break Exit::Closed,
                    }
                }

                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            deadline = Instant::now() + self.idle_timeout;
                            self.handle_text(text.as_str()).await;
                        }
                        Some(Ok(Message::Binary(data))) => {
                            deadline = Instant::now() + self.idle_timeout;
                            debug!(connection_id = %self.connection_id, bytes = data.len(), "Ignoring binary frame");
                        }
                        Some(Ok(Message::Close(_))) | None => break Exit::Closed,
                        Some(Ok(_)) => {
                            deadline = Instant::now() + self.idle_timeout;
                        }
                        Some(Err(tungstenite::Error::ConnectionClosed)) => break Exit::Closed,
                        Some(Err(e)) => return Err(ConnectionError::WebSocket(e.to_string())),
                    }
                }
            }
        };

        if matches!(exit, Exit::Shutdown) {
            debug!(connection_id = %self.connection_id, "Relay shutting down, closing");
        }

        // Sends our close frame, or flushes the reply to the peer's.
        let _ = timeout(WRITE_TIMEOUT, write.close()).await;
        Ok(())
    }

    /// Routes one inbound text frame. Never fails the connection.
    async fn handle_text(&self, raw: &str) {
        if raw.len() > MAX_MESSAGE_SIZE {
            let error = ConnectionError::MessageTooLarge {
                size: raw.len(),
                max: MAX_MESSAGE_SIZE,
            };
            warn!(connection_id = %self.connection_id, error = %error, "Dropping frame");
            return;
        }

        match parse_request(raw) {
            Ok(RelayRequest::SendMessage { data }) => self.handle_send_message(data).await,
            Ok(RelayRequest::Unrouted { action }) => {
                info!(
                    route_key = action.as_deref().unwrap_or("$default"),
                    connection_id = %self.connection_id,
                    body = %raw,
                    "Unrouted request"
                );
            }
            Err(e) => {
                let error = ConnectionError::from(e);
                warn!(
                    connection_id = %self.connection_id,
                    error = %error,
                    body = %raw,
                    "Ignoring invalid request"
                );
            }
        }
    }

    /// Tells the sender its id, then broadcasts the message to everyone.
    async fn handle_send_message(&self, data: String) {
        let identity = ServerFrame::identity(self.connection_id.clone());
        if let Err(e) = self.registry.send_to(self.connection_id.clone(), identity).await {
            warn!(connection_id = %self.connection_id, error = %e, "Failed to send identity");
        }

        let frame = ServerFrame::broadcast(self.connection_id.clone(), data);
        match self.registry.broadcast(frame).await {
            Ok(report) => {
                debug!(
                    connection_id = %self.connection_id,
                    delivered = report.delivered,
                    failed = report.failed.len(),
                    "Message broadcast"
                );
                for recipient in &report.failed {
                    warn!(from = %self.connection_id, to = %recipient, "Delivery failed");
                }
            }
            Err(e) => {
                warn!(connection_id = %self.connection_id, error = %e, "Broadcast failed");
            }
        }
    }
}

/// Writes one text frame with a timeout.
async fn send_text(write: &mut WsSink, json: String) -> Result<(), ConnectionError> {
    match timeout(WRITE_TIMEOUT, write.send(Message::text(json))).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ConnectionError::WebSocket(e.to_string())),
        Err(_) => Err(ConnectionError::WriteTimeout),
    }
}

/// Errors that can occur during connection handling.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    #[error("WebSocket handshake timed out")]
    HandshakeTimeout,

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ProtocolError),

    #[error("Idle timeout")]
    IdleTimeout,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}
