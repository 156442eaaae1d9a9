//! Server-assigned connection identifiers and the write-once session identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Identifier the server assigns to a single WebSocket connection.
///
/// Opaque to the client: it is only ever compared for equality against the
/// `from` field of broadcast frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Creates a new ConnectionId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a shortened display form (first 8 characters).
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ConnectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Session Identity
// ============================================================================

/// The client's own connection id, learned from the server.
///
/// Starts unset and accepts exactly one assignment. Every later assignment
/// is ignored, so records already classified against the first identity
/// never change meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    assigned: Option<ConnectionId>,
}

impl SessionIdentity {
    /// Creates an unset identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the assigned id, if any.
    pub fn get(&self) -> Option<&ConnectionId> {
        self.assigned.as_ref()
    }

    /// Returns true once an id has been assigned.
    pub fn is_assigned(&self) -> bool {
        self.assigned.is_some()
    }

    /// Assigns `id` if no identity is set yet.
    ///
    /// Returns `true` if this call set the identity, `false` if it was
    /// already fixed (in which case `id` is discarded).
    pub fn assign(&mut self, id: ConnectionId) -> bool {
        match &self.assigned {
            Some(current) => {
                if *current != id {
                    debug!(
                        current = %current,
                        ignored = %id,
                        "Session identity already fixed, ignoring new connection id"
                    );
                }
                false
            }
            None => {
                self.assigned = Some(id);
                true
            }
        }
    }

    /// Returns true if `from` names this session.
    ///
    /// An unset identity matches nothing, and neither does a missing `from`.
    pub fn is_own(&self, from: Option<&str>) -> bool {
        match (&self.assigned, from) {
            (Some(own), Some(from)) => own.as_str() == from,
            _ => false,
        }
    }
}
