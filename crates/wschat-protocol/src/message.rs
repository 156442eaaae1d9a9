//! Protocol frame types exchanged between client and relay.

use serde::{Deserialize, Serialize};
use wschat_core::ConnectionId;

use crate::error::{ProtocolError, ProtocolResult};

/// Text broadcast by the relay when a `send_message` request has no `data`.
pub const EMPTY_MESSAGE_PLACEHOLDER: &str = "(empty message)";

/// Route selector carried in the `action` field of client requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Broadcast `data` to every connected participant.
    SendMessage,
}

impl Action {
    /// Wire name of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SendMessage => "send_message",
        }
    }
}

// ============================================================================
// Client → Server
// ============================================================================

/// A request sent by the client.
///
/// Serializes to `{"action":"send_message","data":"<text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// Route selector.
    pub action: Action,
    /// User-authored text, sent verbatim.
    pub data: String,
}

impl OutboundFrame {
    /// Creates a `send_message` request.
    pub fn send_message(text: impl Into<String>) -> Self {
        Self {
            action: Action::SendMessage,
            data: text.into(),
        }
    }

    /// Serializes the frame to its JSON wire form.
    pub fn to_json(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

// ============================================================================
// Server → Client
// ============================================================================

/// A decoded server payload as seen by the client.
///
/// Every field is optional; a single frame may carry an identity, a
/// message, both, or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundFrame {
    /// Identity assigned to the receiving connection.
    pub connection_id: Option<ConnectionId>,
    /// Broadcast message body.
    pub message: Option<String>,
    /// Connection id of the message's author.
    pub from: Option<String>,
}

impl InboundFrame {
    /// Returns true if the frame carries nothing the client acts on.
    pub fn is_empty(&self) -> bool {
        self.connection_id.is_none() && self.message.is_none()
    }
}

/// A payload emitted by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServerFrame {
    /// Tells a connection its own id.
    Identity {
        /// The receiving connection's id.
        #[serde(rename = "connectionId")]
        connection_id: ConnectionId,
    },

    /// A chat message fanned out to every connection.
    Broadcast {
        /// Author connection id.
        from: ConnectionId,
        /// Message body.
        message: String,
    },
}

impl ServerFrame {
    /// Creates an identity frame.
    pub fn identity(connection_id: ConnectionId) -> Self {
        Self::Identity { connection_id }
    }

    /// Creates a broadcast frame.
    pub fn broadcast(from: ConnectionId, message: impl Into<String>) -> Self {
        Self::Broadcast {
            from,
            message: message.into(),
        }
    }

    /// Serializes the frame to its JSON wire form.
    pub fn to_json(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

// ============================================================================
// Relay routing
// ============================================================================

/// A client request after route selection on the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRequest {
    /// `action == "send_message"`.
    SendMessage {
        /// Text to broadcast (placeholder substituted when absent).
        data: String,
    },

    /// Any other action, or none at all.
    Unrouted {
        /// The action that failed to match, if one was present.
        action: Option<String>,
    },
}
