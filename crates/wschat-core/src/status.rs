//! Connection status of a chat session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a session's transport connection.
///
/// Transitions only move forward: `Connecting → Open → Closed`, or
/// `Connecting → Closed` when the handshake fails. Nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Handshake not yet completed.
    #[default]
    Connecting,

    /// Handshake completed, frames may be exchanged.
    Open,

    /// Connection shut down or never established. Terminal.
    Closed,
}

impl ConnectionStatus {
    /// Returns true if frames may be sent.
    pub fn is_open(self) -> bool {
        self == Self::Open
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    ///
    /// Staying in the same state is not a transition.
    pub fn can_transition_to(self, next: ConnectionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Open)
                | (Self::Connecting, Self::Closed)
                | (Self::Open, Self::Closed)
        )
    }

    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
