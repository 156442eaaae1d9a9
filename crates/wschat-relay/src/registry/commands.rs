//! Registry actor commands, errors, and events.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur during registry operations
//! - `RegistryEvent`: Events published by the registry for subscribers
//!
//! All types are designed for async message passing and follow the panic-free policy.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use wschat_core::ConnectionId;
use wschat_protocol::ServerFrame;

/// Outbound queue of a single connection. Carries serialized JSON frames.
pub type Outbox = mpsc::Sender<String>;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command uses a oneshot channel for the response, enabling
/// request-response patterns in async code without blocking.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Register a newly accepted connection.
    ///
    /// # Errors
    /// - `RegistryError::ConnectionAlreadyExists` if the id is taken
    /// - `RegistryError::RegistryFull` if at maximum capacity
    Register {
        /// Server-assigned connection id
        connection_id: ConnectionId,
        /// Queue drained by the connection's writer
        outbox: Outbox,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Remove a connection after it closed.
    ///
    /// # Errors
    /// - `RegistryError::ConnectionNotFound` if the id is unknown
    Unregister {
        /// ID of the connection to remove
        connection_id: ConnectionId,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Deliver a frame to one connection.
    ///
    /// # Errors
    /// - `RegistryError::ConnectionNotFound` if the id is unknown
    /// - `RegistryError::DeliveryFailed` if the connection cannot take it
    SendTo {
        /// Recipient
        connection_id: ConnectionId,
        /// Frame to deliver
        frame: ServerFrame,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Deliver a frame to every registered connection.
    ///
    /// Per-recipient failures are reported, never fatal.
    Broadcast {
        /// Frame to deliver
        frame: ServerFrame,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<BroadcastReport, RegistryError>>,
    },

    /// Get the number of registered connections.
    Count {
        /// Channel to send the result
        respond_to: oneshot::Sender<usize>,
    },

    /// Get the ids of all registered connections.
    ListConnections {
        /// Channel to send the results
        respond_to: oneshot::Sender<Vec<ConnectionId>>,
    },
}

// ============================================================================
// Broadcast Report
// ============================================================================

/// Outcome of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the frame was queued for.
    pub delivered: usize,
    /// Connections that could not take the frame.
    pub failed: Vec<ConnectionId>,
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The registry has reached its maximum connection capacity.
    #[error("registry is full (max: {max} connections)")]
    RegistryFull {
        /// Maximum number of connections allowed
        max: usize,
    },

    /// The requested connection was not found.
    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// A connection with this ID already exists.
    #[error("connection already exists: {0}")]
    ConnectionAlreadyExists(ConnectionId),

    /// A frame could not be queued for a connection.
    #[error("delivery to {connection_id} failed: {reason}")]
    DeliveryFailed {
        /// Recipient
        connection_id: ConnectionId,
        /// Why the frame was not queued
        reason: String,
    },

    /// A frame could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// The response channel was closed before receiving a response.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,
}

// ============================================================================
// Registry Events
// ============================================================================

/// Events published by the registry to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A connection was registered.
    Connected {
        /// ID of the registered connection
        connection_id: ConnectionId,
    },

    /// A connection was removed from the registry.
    Disconnected {
        /// ID of the removed connection
        connection_id: ConnectionId,
        /// Why the connection was removed
        reason: RemovalReason,
    },
}

/// Reason why a connection was removed from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// The connection handler unregistered it on close.
    Closed,

    /// Its outbound queue was gone when a frame was delivered.
    Unreachable,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "connection closed"),
            Self::Unreachable => write!(f, "connection unreachable"),
        }
    }
}
