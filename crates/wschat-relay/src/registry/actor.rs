//! Registry actor - owns the connection table and processes commands.
//!
//! The RegistryActor is the single owner of connection state in the relay.
//! It receives commands via an mpsc channel and publishes events via broadcast.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel send failures are logged but don't panic

use std::collections::HashMap;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use wschat_core::ConnectionId;
use wschat_protocol::ServerFrame;

use super::commands::{
    BroadcastReport, Outbox, RegistryCommand, RegistryError, RegistryEvent, RemovalReason,
};

// ============================================================================
// Resource Limits
// ============================================================================

/// Default maximum number of concurrent connections.
pub const MAX_CONNECTIONS: usize = 1000;

// ============================================================================
// Registry Actor
// ============================================================================

/// The registry actor - owns the connection table.
///
/// Implements the actor pattern: receives commands via mpsc channel,
/// processes them sequentially, and publishes events to subscribers.
/// Because every command runs to completion before the next one starts,
/// a broadcast is queued on every outbox before any later frame is.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Outbound queue of every registered connection
    connections: HashMap<ConnectionId, Outbox>,

    /// Capacity limit
    max_connections: usize,

    /// Event publisher for connection lifecycle events
    event_publisher: broadcast::Sender<RegistryEvent>,
}

impl RegistryActor {
    /// Creates a new registry actor with the default capacity.
    pub fn new(
        receiver: mpsc::Receiver<RegistryCommand>,
        event_publisher: broadcast::Sender<RegistryEvent>,
    ) -> Self {
        Self::with_capacity(receiver, event_publisher, MAX_CONNECTIONS)
    }

    /// Creates a new registry actor that accepts at most `max_connections`.
    pub fn with_capacity(
        receiver: mpsc::Receiver<RegistryCommand>,
        event_publisher: broadcast::Sender<RegistryEvent>,
        max_connections: usize,
    ) -> Self {
        Self {
            receiver,
            connections: HashMap::new(),
            max_connections,
            event_publisher,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    pub async fn run(mut self) {
        info!(max_connections = self.max_connections, "Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            connections = self.connections.len(),
            "Registry actor stopped"
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Register {
                connection_id,
                outbox,
                respond_to,
            } => {
                let result = self.handle_register(connection_id, outbox);
                // Ignore send error - client may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::Unregister {
                connection_id,
                respond_to,
            } => {
                let result = self.handle_unregister(&connection_id, RemovalReason::Closed);
                let _ = respond_to.send(result);
            }
            RegistryCommand::SendTo {
                connection_id,
                frame,
                respond_to,
            } => {
                let result = self.handle_send_to(connection_id, &frame);
                let _ = respond_to.send(result);
            }
            RegistryCommand::Broadcast { frame, respond_to } => {
                let result = self.handle_broadcast(&frame);
                let _ = respond_to.send(result);
            }
            RegistryCommand::Count { respond_to } => {
                let _ = respond_to.send(self.connections.len());
            }
            RegistryCommand::ListConnections { respond_to } => {
                let mut ids: Vec<ConnectionId> = self.connections.keys().cloned().collect();
                ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                let _ = respond_to.send(ids);
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_register(
        &mut self,
        connection_id: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), RegistryError> {
        if self.connections.contains_key(&connection_id) {
            return Err(RegistryError::ConnectionAlreadyExists(connection_id));
        }

        if self.connections.len() >= self.max_connections {
            warn!(
                connection_id = %connection_id,
                current = self.connections.len(),
                max = self.max_connections,
                "Registry is full, rejecting connection"
            );
            return Err(RegistryError::RegistryFull {
                max: self.max_connections,
            });
        }

        self.connections.insert(connection_id.clone(), outbox);
        debug!(
            connection_id = %connection_id,
            total = self.connections.len(),
            "Connection registered"
        );

        self.publish(RegistryEvent::Connected { connection_id });
        Ok(())
    }

    fn handle_unregister(
        &mut self,
        connection_id: &ConnectionId,
        reason: RemovalReason,
    ) -> Result<(), RegistryError> {
        if self.connections.remove(connection_id).is_none() {
            return Err(RegistryError::ConnectionNotFound(connection_id.clone()));
        }

        debug!(
            connection_id = %connection_id,
            reason = %reason,
            total = self.connections.len(),
            "Connection unregistered"
        );

        self.publish(RegistryEvent::Disconnected {
            connection_id: connection_id.clone(),
            reason,
        });
        Ok(())
    }

    fn handle_send_to(
        &mut self,
        connection_id: ConnectionId,
        frame: &ServerFrame,
    ) -> Result<(), RegistryError> {
        let json = frame
            .to_json()
            .map_err(|e| RegistryError::Encode(e.to_string()))?;

        let outbox = self
            .connections
            .get(&connection_id)
            .ok_or_else(|| RegistryError::ConnectionNotFound(connection_id.clone()))?;

        match outbox.try_send(json) {
            Ok(()) => Ok(()),
            Err(e) => {
                let reason = self.delivery_failed(&connection_id, &e);
                Err(RegistryError::DeliveryFailed {
                    connection_id,
                    reason,
                })
            }
        }
    }

    fn handle_broadcast(&mut self, frame: &ServerFrame) -> Result<BroadcastReport, RegistryError> {
        let json = frame
            .to_json()
            .map_err(|e| RegistryError::Encode(e.to_string()))?;

        let mut report = BroadcastReport::default();
        let mut failures = Vec::new();

        for (connection_id, outbox) in &self.connections {
            match outbox.try_send(json.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => failures.push((connection_id.clone(), e)),
            }
        }

        for (connection_id, error) in failures {
            let reason = self.delivery_failed(&connection_id, &error);
            debug!(connection_id = %connection_id, reason = %reason, "Broadcast recipient skipped");
            report.failed.push(connection_id);
        }

        debug!(
            delivered = report.delivered,
            failed = report.failed.len(),
            "Broadcast complete"
        );
        Ok(report)
    }

    /// Logs a failed delivery and drops the connection if its queue is gone.
    fn delivery_failed(
        &mut self,
        connection_id: &ConnectionId,
        error: &TrySendError<String>,
    ) -> String {
        match error {
            TrySendError::Full(_) => {
                warn!(connection_id = %connection_id, "Outbound queue full, dropping frame");
                "outbound queue full".to_string()
            }
            TrySendError::Closed(_) => {
                warn!(connection_id = %connection_id, "Connection gone, unregistering");
                let _ = self.handle_unregister(connection_id, RemovalReason::Unreachable);
                "connection gone".to_string()
            }
        }
    }

    fn publish(&self, event: RegistryEvent) {
        // No subscribers is fine.
        let _ = self.event_publisher.send(event);
    }

    // ========================================================================
    // Accessors (for testing)
    // ========================================================================

    #[cfg(test)]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
