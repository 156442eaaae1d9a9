//! Chat client facade.
//!
//! `ChatClient` ties one [`SessionConnection`] to one [`MessageRouter`] and
//! turns connection events into [`ClientUpdate`]s for the presentation layer.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::collections::VecDeque;

use tokio::sync::{mpsc, watch};
use tracing::debug;
use wschat_core::{ConnectionId, ConnectionStatus, DisplayRecord};

use crate::config::ChatConfig;
use crate::connection::{ConnectionEvent, ConnectionHandle, FrameSink, SessionConnection};
use crate::error::Result;
use crate::router::{MessageRouter, SendOutcome};

/// A change the presentation layer should render.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientUpdate {
    /// The connection status changed.
    StatusChanged(ConnectionStatus),
    /// The server told this session its id.
    IdentityAssigned(ConnectionId),
    /// A record was appended to the message log.
    Record(DisplayRecord),
}

/// A single chat session.
///
/// # Example
///
/// ```rust,ignore
/// use wschat_client::{ChatClient, ChatConfig, ClientUpdate};
///
/// let mut client = ChatClient::new(ChatConfig::new("ws://127.0.0.1:9001"));
/// client.open()?;
///
/// while let Some(update) = client.next_update().await {
///     if let ClientUpdate::StatusChanged(status) = update {
///         if status.is_open() {
///             client.send_text("hello")?;
///         }
///     }
/// }
/// ```
pub struct ChatClient {
    connection: SessionConnection,
    router: MessageRouter<ConnectionHandle>,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    pending: VecDeque<ClientUpdate>,
    close_reason: Option<String>,
}

impl ChatClient {
    /// Creates a client. Does not connect.
    pub fn new(config: ChatConfig) -> Self {
        let (connection, events) = SessionConnection::new(config);
        let router = MessageRouter::new(connection.handle());

        Self {
            connection,
            router,
            events,
            pending: VecDeque::new(),
            close_reason: None,
        }
    }

    /// Starts connecting. See [`SessionConnection::open`].
    pub fn open(&mut self) -> Result<()> {
        self.connection.open()
    }

    /// Sends user-authored text. See [`MessageRouter::send_text`].
    pub fn send_text(&self, text: &str) -> Result<SendOutcome> {
        self.router.send_text(text)
    }

    /// Requests that the connection be closed. Fire-and-forget.
    pub fn disconnect(&self) {
        self.router.disconnect();
    }

    /// Waits for the next update.
    ///
    /// Returns `None` once the connection has ended and every update has
    /// been delivered. Before `open()` this waits indefinitely.
    pub async fn next_update(&mut self) -> Option<ClientUpdate> {
        loop {
            if let Some(update) = self.pending.pop_front() {
                return Some(update);
            }

            let event = self.events.recv().await?;
            self.apply(event);
        }
    }

    fn apply(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Opened => {
                self.pending
                    .push_back(ClientUpdate::StatusChanged(ConnectionStatus::Open));
            }
            ConnectionEvent::Message(raw) => {
                let routed = self.router.handle_inbound(&raw);
                if let Some(id) = routed.identity_assigned {
                    self.pending.push_back(ClientUpdate::IdentityAssigned(id));
                }
                if let Some(record) = routed.record {
                    self.pending.push_back(ClientUpdate::Record(record));
                }
            }
            ConnectionEvent::Closed { reason } => {
                debug!(reason = ?reason, "Session closed");
                self.close_reason = reason;
                self.pending
                    .push_back(ClientUpdate::StatusChanged(ConnectionStatus::Closed));
            }
        }
    }

    /// All records received so far, in arrival order.
    pub fn records(&self) -> &[DisplayRecord] {
        self.router.records()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.router.sink().status()
    }

    pub fn identity(&self) -> Option<&ConnectionId> {
        self.router.identity()
    }

    /// Why the connection closed, if it ended with an error.
    pub fn close_reason(&self) -> Option<&str> {
        self.close_reason.as_deref()
    }

    /// Receiver for observing status from another task.
    pub fn status_receiver(&self) -> watch::Receiver<ConnectionStatus> {
        self.router.sink().status_receiver()
    }

    pub fn config(&self) -> &ChatConfig {
        self.connection.config()
    }
}
