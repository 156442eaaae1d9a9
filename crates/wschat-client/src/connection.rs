//! WebSocket session connection.
//!
//! `SessionConnection` owns the transport. Opening it spawns a task that
//! performs the handshake, forwards outbound frames, and reports inbound
//! frames and lifecycle changes as [`ConnectionEvent`]s on a channel.
//!
//! Status follows `Connecting → Open → Closed` (or `Connecting → Closed` when
//! the handshake fails) and is published through a `watch` channel, so any
//! [`ConnectionHandle`] can read it without touching the transport.
//!
//! Once a close is requested the connection stops accepting frames, and the
//! close handshake is bounded by [`ChatConfig::close_timeout`]: a peer that
//! never answers still ends in `Closed`.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, timeout, Instant};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::connect_async;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wschat_core::ConnectionStatus;
use wschat_protocol::OutboundFrame;

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};

// ============================================================================
// Events and Commands
// ============================================================================

/// Notifications emitted by the transport task, in transport order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The handshake completed; status is now `Open`.
    Opened,

    /// A text frame arrived.
    Message(String),

    /// The connection is closed; status is now `Closed`.
    Closed {
        /// Why the connection ended, if it was not a clean close.
        reason: Option<String>,
    },
}

/// Requests from handles to the transport task.
#[derive(Debug)]
enum TransportCommand {
    Send(String),
    Close,
}

// ============================================================================
// Frame Sink
// ============================================================================

/// Outbound side of a connection, as seen by the message router.
pub trait FrameSink {
    /// Current connection status.
    fn status(&self) -> ConnectionStatus;

    /// Transmits a frame as a single text message.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotOpen` unless the status is `Open`, or
    /// `ChatError::Closing` once a close has been requested. Nothing is
    /// queued for later delivery.
    fn send(&self, frame: &OutboundFrame) -> Result<()>;

    /// Requests shutdown if the connection is open; otherwise does nothing.
    fn close(&self);
}

/// Cloneable handle to a [`SessionConnection`].
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    status_rx: watch::Receiver<ConnectionStatus>,
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    closing: Arc<AtomicBool>,
}

impl ConnectionHandle {
    /// Returns a receiver that observes status changes.
    pub fn status_receiver(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Returns true once a close has been requested.
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }
}

impl FrameSink for ConnectionHandle {
    fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    fn send(&self, frame: &OutboundFrame) -> Result<()> {
        let status = self.status();
        if !status.is_open() {
            return Err(ChatError::NotOpen { status });
        }
        if self.is_closing() {
            return Err(ChatError::Closing);
        }

        let json = frame.to_json()?;
        self.command_tx
            .send(TransportCommand::Send(json))
            .map_err(|_| ChatError::NotOpen {
                status: self.status(),
            })
    }

    fn close(&self) {
        if !self.status().is_open() {
            debug!(status = %self.status(), "Close ignored, connection not open");
            return;
        }

        if self.closing.swap(true, Ordering::AcqRel) {
            debug!("Close already requested");
            return;
        }

        // A closed channel means the task already ended.
        let _ = self.command_tx.send(TransportCommand::Close);
    }
}

// ============================================================================
// Session Connection
// ============================================================================

/// Owner of the single WebSocket connection of a chat session.
///
/// # Example
///
/// ```rust,ignore
/// let (mut connection, mut events) = SessionConnection::new(ChatConfig::default());
/// connection.open()?;
///
/// while let Some(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// ```
pub struct SessionConnection {
    config: ChatConfig,

    /// Present until `open()` hands it to the transport task.
    status_tx: Option<watch::Sender<ConnectionStatus>>,

    status_rx: watch::Receiver<ConnectionStatus>,

    command_tx: mpsc::UnboundedSender<TransportCommand>,

    command_rx: Option<mpsc::UnboundedReceiver<TransportCommand>>,

    /// Moves into the transport task so the event stream ends with it.
    event_tx: Option<mpsc::UnboundedSender<ConnectionEvent>>,

    /// Set by the first close request; shared with every handle.
    closing: Arc<AtomicBool>,

    cancel_token: CancellationToken,
}

impl SessionConnection {
    /// Creates an unopened connection and the receiver for its events.
    pub fn new(config: ChatConfig) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let connection = Self {
            config,
            status_tx: Some(status_tx),
            status_rx,
            command_tx,
            command_rx: Some(command_rx),
            event_tx: Some(event_tx),
            closing: Arc::new(AtomicBool::new(false)),
            cancel_token: CancellationToken::new(),
        };

        (connection, event_rx)
    }

    /// Starts the handshake on a background task.
    ///
    /// Calling this again after the first call does nothing, whether the
    /// connection is still connecting, open, or closed. Must be called from
    /// within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidEndpoint` if the configured endpoint is not
    /// a WebSocket URL. The connection moves straight to `Closed`.
    pub fn open(&mut self) -> Result<()> {
        let (Some(status_tx), Some(command_rx), Some(event_tx)) = (
            self.status_tx.take(),
            self.command_rx.take(),
            self.event_tx.take(),
        ) else {
            debug!("open() ignored, connection already started");
            return Ok(());
        };

        let reporter = StatusReporter {
            status_tx,
            event_tx,
        };

        let endpoint = match self.config.endpoint_url() {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(endpoint = %self.config.endpoint, error = %e, "Refusing to connect");
                reporter.closed(Some(e.to_string()));
                return Err(e);
            }
        };

        let task = TransportTask {
            endpoint,
            connect_timeout: self.config.connect_timeout,
            close_timeout: self.config.close_timeout,
            closing: Arc::clone(&self.closing),
            reporter,
            command_rx,
            cancel_token: self.cancel_token.clone(),
        };

        tokio::spawn(task.run());
        Ok(())
    }

    /// Returns a handle for sending frames and reading status.
    pub fn handle(&self) -> ConnectionHandle {
        ConnectionHandle {
            status_rx: self.status_rx.clone(),
            command_tx: self.command_tx.clone(),
            closing: Arc::clone(&self.closing),
        }
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// The configuration this connection was built with.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

impl Drop for SessionConnection {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

// ============================================================================
// Transport Task
// ============================================================================

/// Publishes status transitions and their matching events.
struct StatusReporter {
    status_tx: watch::Sender<ConnectionStatus>,
    event_tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl StatusReporter {
    fn transition(&self, next: ConnectionStatus) -> bool {
        let current = *self.status_tx.borrow();
        if !current.can_transition_to(next) {
            debug!(from = %current, to = %next, "Ignoring invalid status transition");
            return false;
        }
        self.status_tx.send_replace(next);
        true
    }

    fn opened(&self) {
        if self.transition(ConnectionStatus::Open) {
            let _ = self.event_tx.send(ConnectionEvent::Opened);
        }
    }

    fn message(&self, raw: String) {
        let _ = self.event_tx.send(ConnectionEvent::Message(raw));
    }

    fn closed(&self, reason: Option<String>) {
        if self.transition(ConnectionStatus::Closed) {
            let _ = self.event_tx.send(ConnectionEvent::Closed { reason });
        }
    }
}

struct TransportTask {
    endpoint: String,
    connect_timeout: Duration,
    close_timeout: Duration,
    closing: Arc<AtomicBool>,
    reporter: StatusReporter,
    command_rx: mpsc::UnboundedReceiver<TransportCommand>,
    cancel_token: CancellationToken,
}

impl TransportTask {
    async fn run(mut self) {
        let endpoint = self.endpoint.clone();
        info!(endpoint = %endpoint, "Connecting");

        let handshake = timeout(self.connect_timeout, connect_async(endpoint.as_str()));
        let result = tokio::select! {
            _ = self.cancel_token.cancelled() => {
                debug!("Connection cancelled during handshake");
                self.reporter.closed(None);
                return;
            }
            result = handshake => result,
        };

        let stream = match result {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                let error = ChatError::Transport(e.to_string());
                warn!(endpoint = %endpoint, error = %error, "Handshake failed");
                self.reporter.closed(Some(error.to_string()));
                return;
            }
            Err(_) => {
                let error = ChatError::ConnectTimeout(self.connect_timeout);
                warn!(endpoint = %endpoint, error = %error, "Handshake timed out");
                self.reporter.closed(Some(error.to_string()));
                return;
            }
        };

        info!(endpoint = %endpoint, "Connection open");
        self.reporter.opened();

        let (mut write, mut read) = stream.split();

        // Set once our close frame is out; the peer must answer before it.
        let mut close_deadline: Option<Instant> = None;

        let reason = loop {
            let closing = close_deadline.is_some();
            let deadline = close_deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                _ = self.cancel_token.cancelled(), if !closing => {
                    debug!("Connection cancelled, sending close frame");
                    match self.begin_close(&mut write).await {
                        Ok(deadline) => close_deadline = Some(deadline),
                        Err(reason) => break reason,
                    }
                }

                _ = sleep_until(deadline), if closing => {
                    let error = ChatError::CloseTimeout(self.close_timeout);
                    break Some(error.to_string());
                }

                command = self.command_rx.recv(), if !closing => {
                    match command {
                        Some(TransportCommand::Send(text)) => {
                            debug!(bytes = text.len(), "Sending frame");
                            if let Err(e) = write.send(Message::text(text)).await {
                                break Some(ChatError::Transport(e.to_string()).to_string());
                            }
                        }
                        Some(TransportCommand::Close) | None => {
                            info!("Closing connection");
                            match self.begin_close(&mut write).await {
                                Ok(deadline) => close_deadline = Some(deadline),
                                Err(reason) => break reason,
                            }
                        }
                    }
                }

                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.reporter.message(text.as_str().to_string());
                        }
                        Some(Ok(Message::Binary(data))) => {
                            debug!(bytes = data.len(), "Ignoring binary frame");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "Close frame received");
                        }
                        Some(Ok(_)) => {}
                        Some(Err(tungstenite::Error::ConnectionClosed))
                        | Some(Err(tungstenite::Error::AlreadyClosed)) => break None,
                        Some(Err(e)) => {
                            if closing {
                                debug!(error = %e, "Error while closing");
                                break None;
                            }
                            break Some(ChatError::Transport(e.to_string()).to_string());
                        }
                        None => break None,
                    }
                }
            }
        };

        match &reason {
            Some(reason) => warn!(reason = %reason, "Connection closed with error"),
            None => info!("Connection closed"),
        }
        self.reporter.closed(reason);
    }

    /// Sends our close frame and returns the deadline for the peer's reply.
    ///
    /// `Err` carries the close reason when the loop should end right away.
    async fn begin_close<S>(&self, write: &mut S) -> std::result::Result<Instant, Option<String>>
    where
        S: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        self.closing.store(true, Ordering::Release);
        let deadline = Instant::now() + self.close_timeout;

        match timeout(self.close_timeout, write.send(Message::Close(None))).await {
            Ok(Ok(())) => Ok(deadline),
            Ok(Err(e)) => {
                debug!(error = %e, "Failed to send close frame");
                Err(None)
            }
            Err(_) => Err(Some(ChatError::CloseTimeout(self.close_timeout).to_string())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
