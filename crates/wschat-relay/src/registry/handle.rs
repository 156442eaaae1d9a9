//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending commands
//! to the registry actor and subscribing to connection events.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use tokio::sync::{broadcast, mpsc, oneshot};
use wschat_core::ConnectionId;
use wschat_protocol::ServerFrame;

use super::commands::{BroadcastReport, Outbox, RegistryCommand, RegistryError, RegistryEvent};

// ============================================================================
// Registry Handle
// ============================================================================

/// Handle for interacting with the registry actor.
///
/// This is a cheap-to-clone handle that can be shared across tasks.
/// All methods are async and communicate with the actor via channels.
///
/// # Usage
///
/// ```ignore
/// let handle = registry_handle.clone();
///
/// handle.register(id.clone(), outbox).await?;
/// handle.send_to(id.clone(), ServerFrame::identity(id.clone())).await?;
/// handle.broadcast(ServerFrame::broadcast(id, "hello")).await?;
/// ```
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,

    /// Event broadcaster for subscribing to updates
    event_sender: broadcast::Sender<RegistryEvent>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    pub fn new(
        sender: mpsc::Sender<RegistryCommand>,
        event_sender: broadcast::Sender<RegistryEvent>,
    ) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Sends a command built around a fresh reply channel and awaits the reply.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, RegistryError> {
        let (respond_to, reply) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;
        reply.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Register a connection and the queue its writer drains.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ConnectionAlreadyExists` if the id is taken
    /// - `RegistryError::RegistryFull` if the registry is at maximum capacity
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), RegistryError> {
        self.request(|respond_to| RegistryCommand::Register {
            connection_id,
            outbox,
            respond_to,
        })
        .await?
    }

    /// Remove a connection.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ConnectionNotFound` if the id is unknown
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn unregister(&self, connection_id: ConnectionId) -> Result<(), RegistryError> {
        self.request(|respond_to| RegistryCommand::Unregister {
            connection_id,
            respond_to,
        })
        .await?
    }

    /// Queue a frame for one connection.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ConnectionNotFound` if the id is unknown
    /// - `RegistryError::DeliveryFailed` if the frame could not be queued
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn send_to(
        &self,
        connection_id: ConnectionId,
        frame: ServerFrame,
    ) -> Result<(), RegistryError> {
        self.request(|respond_to| RegistryCommand::SendTo {
            connection_id,
            frame,
            respond_to,
        })
        .await?
    }

    /// Queue a frame for every registered connection.
    ///
    /// # Errors
    ///
    /// - `RegistryError::Encode` if the frame cannot be serialized
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn broadcast(&self, frame: ServerFrame) -> Result<BroadcastReport, RegistryError> {
        self.request(|respond_to| RegistryCommand::Broadcast { frame, respond_to })
            .await?
    }

    /// Number of registered connections, or 0 if the actor is gone.
    pub async fn connection_count(&self) -> usize {
        self.request(|respond_to| RegistryCommand::Count { respond_to })
            .await
            .unwrap_or_default()
    }

    /// Ids of all registered connections, sorted. Empty if the actor is gone.
    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        self.request(|respond_to| RegistryCommand::ListConnections { respond_to })
            .await
            .unwrap_or_default()
    }

    /// Subscribe to connection events.
    ///
    /// This is a synchronous operation - it doesn't communicate with the actor.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_sender.subscribe()
    }

    /// Check if the actor is still running.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, _event_rx) = broadcast::channel(16);
        let handle = RegistryHandle::new(cmd_tx, event_tx);
        (handle, cmd_rx)
    }

    #[tokio::test]
    async fn test_register_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::Register {
                connection_id,
                respond_to,
                ..
            }) = rx.recv().await
            {
                assert_eq!(connection_id.as_str(), "conn-1");
                let _ = respond_to.send(Ok(()));
                return true;
            }
            false
        });

        let (outbox, _inbox) = mpsc::channel(1);
        let result = handle.register(ConnectionId::new("conn-1"), outbox).await;
        assert!(result.is_ok());
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_register_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let (outbox, _inbox) = mpsc::channel(1);
        let result = handle.register(ConnectionId::new("conn-1"), outbox).await;

        assert!(matches!(result, Err(RegistryError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_broadcast_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::Broadcast { frame, respond_to }) = rx.recv().await {
                assert_eq!(
                    frame,
                    ServerFrame::broadcast(ConnectionId::new("conn-1"), "hi")
                );
                let _ = respond_to.send(Ok(BroadcastReport {
                    delivered: 3,
                    failed: Vec::new(),
                }));
                return true;
            }
            false
        });

        let report = handle
            .broadcast(ServerFrame::broadcast(ConnectionId::new("conn-1"), "hi"))
            .await
            .unwrap();
        assert_eq!(report.delivered, 3);
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_queries_return_defaults_on_channel_close() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert_eq!(handle.connection_count().await, 0);
        assert!(handle.connection_ids().await.is_empty());
        assert!(matches!(
            handle.unregister(ConnectionId::new("conn-1")).await,
            Err(RegistryError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_is_connected() {
        let (handle, rx) = create_test_handle();
        assert!(handle.is_connected());

        drop(rx);
        assert!(!handle.is_connected());
    }
}
