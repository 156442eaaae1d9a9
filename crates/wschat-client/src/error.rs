//! Error types for the wschat client.
//!
//! This module defines the errors that can occur while configuring a
//! session, sending messages, talking to the transport, and driving the
//! terminal front end.
//!
//! Every error here is recoverable locally: none of them tears down the
//! process or touches the message log.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::io;
use std::time::Duration;

use thiserror::Error;
use wschat_core::ConnectionStatus;
use wschat_protocol::ProtocolError;

// ============================================================================
// Client Error Type
// ============================================================================

/// Chat client errors.
///
/// # Send Errors
///
/// `NotOpen` and `Closing` are the only errors `send_text` returns for a
/// well-formed message. The message is dropped, never queued, and the caller
/// keeps the user's input.
///
/// # Example
///
/// ```rust,ignore
/// use wschat_client::error::ChatError;
///
/// match client.send_text(&input) {
///     Ok(outcome) if outcome.is_sent() => input.clear(),
///     Ok(_) => {}
///     Err(ChatError::NotOpen { status }) => show_notice(status),
///     Err(e) => log_error(e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum ChatError {
    /// A send was attempted while the connection was not open.
    #[error("Connection is not open (status: {status})")]
    NotOpen {
        /// Status at the time of the attempt.
        status: ConnectionStatus,
    },

    /// A send was attempted after a close was requested but before the
    /// connection reached `Closed`.
    #[error("Connection is closing")]
    Closing,

    /// An inbound payload could not be decoded.
    ///
    /// Logged and dropped; the session continues.
    #[error("Failed to parse frame: {0}")]
    Parse(#[from] ProtocolError),

    /// The underlying WebSocket failed.
    ///
    /// Surfaces to the collaborator as a transition to `Closed`.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The handshake did not complete in time.
    #[error("Connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The peer did not complete the close handshake in time.
    #[error("Close handshake timed out after {0:?}")]
    CloseTimeout(Duration),

    /// The configured endpoint is not a WebSocket URL.
    #[error("Invalid endpoint '{0}': expected a ws:// or wss:// URL")]
    InvalidEndpoint(String),

    /// Failed to initialize the terminal.
    #[error("Failed to initialize terminal: {0}")]
    TerminalInit(String),

    /// Failed to cleanup/restore the terminal.
    #[error("Failed to restore terminal: {0}")]
    TerminalCleanup(String),

    /// I/O error passthrough.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ChatError {
    /// Returns true if the error came from sending on a connection that no
    /// longer accepts frames.
    pub fn is_not_open(&self) -> bool {
        matches!(self, Self::NotOpen { .. } | Self::Closing)
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ChatError>;

// ============================================================================
// Tests
// ============================================================================
