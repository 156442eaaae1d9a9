//! WebSocket server for the wschat relay.
//!
//! The server:
//! - Listens on a TCP socket for WebSocket clients
//! - Assigns each accepted connection an id of the form `conn-<n>`
//! - Spawns a ConnectionHandler per client
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   RelayServer   │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ConnectionHandler│────▶│  RegistryHandle │
//! │   (per client)  │     │                 │
//! └─────────────────┘     └────────┬────────┘
//!         ▲                        │
//!         │ outbound queue         │ send_to / broadcast
//!         └────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Server errors are logged and allow continued operation

mod connection;

pub use connection::{ConnectionError, ConnectionHandler, IDLE_TIMEOUT, MAX_MESSAGE_SIZE};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use wschat_core::ConnectionId;

use crate::registry::RegistryHandle;

/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:9001";

/// WebSocket relay server.
///
/// Accepts clients and hands each one to a [`ConnectionHandler`].
pub struct RelayServer {
    /// Bound listener
    listener: TcpListener,

    /// Handle to the connection registry
    registry: RegistryHandle,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter for generating connection ids
    connection_counter: AtomicU64,

    /// Idle timeout applied to every connection
    idle_timeout: Duration,
}

impl RelayServer {
    /// Binds the server to `addr`.
    ///
    /// Binding happens up front so callers can read the actual address
    /// (useful with port 0) before calling [`run`](Self::run).
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to listen on
    /// * `registry` - Handle to the connection registry
    /// * `cancel_token` - Token for graceful shutdown
    pub async fn bind(
        addr: SocketAddr,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr,
                error: e.to_string(),
            })?;

        Ok(Self {
            listener,
            registry,
            cancel_token,
            connection_counter: AtomicU64::new(0),
            idle_timeout: IDLE_TIMEOUT,
        })
    }

    /// Overrides the per-connection idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Returns the address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::LocalAddr(e.to_string()))
    }

    /// Runs the server.
    ///
    /// Accepts connections until the cancellation token is triggered. Open
    /// connections observe the same token and close themselves.
    pub async fn run(self) -> Result<(), ServerError> {
        info!(addr = %self.local_addr()?, "Relay listening");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let conn_num = self.connection_counter.fetch_add(1, Ordering::Relaxed) + 1;
                            debug!(peer = %peer, conn_num, "Accepted TCP connection");
                            self.handle_connection(stream, conn_num);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            // Continue accepting other connections
                        }
                    }
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Spawns a handler task for an accepted stream.
    fn handle_connection(&self, stream: TcpStream, connection_number: u64) {
        let handler = ConnectionHandler::new(
            connection_id_for(connection_number),
            self.registry.clone(),
            self.cancel_token.child_token(),
        )
        .with_idle_timeout(self.idle_timeout);

        tokio::spawn(async move {
            let connection_id = handler.connection_id().clone();
            if let Err(e) = handler.run(stream).await {
                debug!(connection_id = %connection_id, error = %e, "Connection ended with error");
            }
        });
    }
}

/// Formats the id for the n-th accepted connection.
fn connection_id_for(connection_number: u64) -> ConnectionId {
    ConnectionId::new(format!("conn-{connection_number}"))
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: SocketAddr, error: String },

    #[error("Failed to read local address: {0}")]
    LocalAddr(String),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::spawn_registry;

    #[test]
    fn test_default_bind_addr() {
        let addr: SocketAddr = DEFAULT_BIND_ADDR.parse().unwrap();
        assert_eq!(addr.port(), 9001);
    }

    #[test]
    fn test_connection_id_format() {
        assert_eq!(connection_id_for(1).as_str(), "conn-1");
        assert_eq!(connection_id_for(42).as_str(), "conn-42");
    }

    #[test]
    fn test_server_error_display() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:9001".parse().unwrap(),
            error: "address in use".to_string(),
        };
        assert!(err.to_string().contains("127.0.0.1:9001"));
        assert!(err.to_string().contains("address in use"));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let registry = spawn_registry();
        let server = RelayServer::bind(
            "127.0.0.1:0".parse().unwrap(),
            registry,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let registry = spawn_registry();
        let cancel = CancellationToken::new();
        let server = RelayServer::bind("127.0.0.1:0".parse().unwrap(), registry, cancel.clone())
            .await
            .unwrap();

        let task = tokio::spawn(server.run());
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(2), task).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
