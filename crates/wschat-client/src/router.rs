//! Message routing and attribution.
//!
//! The router owns the session identity and the message log. Inbound raw
//! frames are parsed, may fix the identity, and may append a record whose
//! origin is decided by comparing `from` against that identity. Outbound
//! text is validated and framed before reaching the [`FrameSink`].

use tracing::{debug, warn};
use wschat_core::{ConnectionId, DisplayRecord, MessageLog, Origin, SessionIdentity};
use wschat_protocol::{parse_inbound, OutboundFrame};

use crate::connection::FrameSink;
use crate::error::{ChatError, Result};

/// Result of a successful `send_text` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A frame was handed to the transport; the input can be cleared.
    Sent,
    /// The text was blank; nothing was sent and the input is kept.
    Suppressed,
}

impl SendOutcome {
    pub fn is_sent(self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Effects of one inbound frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routed {
    /// Set when this frame fixed the session identity.
    pub identity_assigned: Option<ConnectionId>,
    /// Set when this frame appended a record to the log.
    pub record: Option<DisplayRecord>,
}

/// Attribution state plus the outbound path of a chat session.
#[derive(Debug)]
pub struct MessageRouter<S> {
    sink: S,
    identity: SessionIdentity,
    log: MessageLog,
}

impl<S: FrameSink> MessageRouter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            identity: SessionIdentity::new(),
            log: MessageLog::new(),
        }
    }

    /// Processes one raw inbound frame.
    ///
    /// Malformed payloads are logged and dropped with no effect. Within a
    /// single frame the identity is applied before the message is
    /// classified.
    pub fn handle_inbound(&mut self, raw: &str) -> Routed {
        let frame = match parse_inbound(raw) {
            Ok(frame) => frame,
            Err(e) => {
                let error = ChatError::from(e);
                warn!(error = %error, raw_len = raw.len(), "Dropping inbound frame");
                return Routed::default();
            }
        };

        let mut routed = Routed::default();

        if let Some(id) = frame.connection_id {
            if self.identity.assign(id.clone()) {
                debug!(connection_id = %id, "Session identity assigned");
                routed.identity_assigned = Some(id);
            }
        }

        if let Some(text) = frame.message {
            let origin = if self.identity.is_own(frame.from.as_deref()) {
                Origin::Own
            } else {
                Origin::Other
            };
            let record = DisplayRecord::new(origin, text);
            self.log.append(record.clone());
            routed.record = Some(record);
        }

        routed
    }

    /// Sends user-authored text.
    ///
    /// Text that is empty after trimming is suppressed without touching the
    /// sink. Otherwise the text is sent verbatim, untrimmed.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotOpen` if the connection is not open, or
    /// `ChatError::Closing` after `disconnect()`.
    pub fn send_text(&self, text: &str) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Ok(SendOutcome::Suppressed);
        }

        self.sink.send(&OutboundFrame::send_message(text))?;
        Ok(SendOutcome::Sent)
    }

    /// Requests that the connection be closed.
    pub fn disconnect(&self) {
        self.sink.close();
    }

    pub fn identity(&self) -> Option<&ConnectionId> {
        self.identity.get()
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn records(&self) -> &[DisplayRecord] {
        self.log.records()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
