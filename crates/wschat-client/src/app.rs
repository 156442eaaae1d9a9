//! Application state for the wschat terminal front end.
//!
//! The front end is a collaborator of [`ChatClient`](crate::ChatClient): it
//! mirrors the client's status, identity, and records, and owns the input
//! buffer the user edits.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

use wschat_core::{ConnectionId, ConnectionStatus, DisplayRecord};

use crate::client::ClientUpdate;
use crate::error::ChatError;

/// Lines moved per scroll step.
const SCROLL_STEP: usize = 1;

/// State rendered by the terminal front end.
#[derive(Debug, Clone)]
pub struct App {
    /// Endpoint shown in the header.
    pub endpoint: String,

    /// Mirror of the connection status.
    pub status: ConnectionStatus,

    /// Identity learned from the server, once known.
    pub identity: Option<ConnectionId>,

    /// Records in arrival order.
    pub records: Vec<DisplayRecord>,

    /// Text being composed.
    pub input: String,

    /// One-line message shown above the input (e.g. a failed send).
    pub notice: Option<String>,

    /// Lines scrolled up from the newest record. Zero follows the tail.
    pub scroll_offset: usize,

    /// Flag indicating the application should quit.
    pub should_quit: bool,
}

impl App {
    /// Creates a new App in the Connecting state.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: ConnectionStatus::Connecting,
            identity: None,
            records: Vec::new(),
            input: String::new(),
            notice: None,
            scroll_offset: 0,
            should_quit: false,
        }
    }

    /// Applies one update from the chat client.
    pub fn apply_update(&mut self, update: ClientUpdate) {
        match update {
            ClientUpdate::StatusChanged(status) => {
                self.status = status;
                if status.is_open() {
                    self.notice = None;
                }
            }
            ClientUpdate::IdentityAssigned(id) => {
                self.identity = Some(id);
            }
            ClientUpdate::Record(record) => {
                self.records.push(record);
                if self.scroll_offset > 0 {
                    // Keep the viewport anchored while the user reads history.
                    let max = self.records.len().saturating_sub(1);
                    self.scroll_offset = (self.scroll_offset + 1).min(max);
                }
            }
        }
    }

    /// Records why the connection ended.
    pub fn mark_closed(&mut self, reason: Option<&str>) {
        self.status = ConnectionStatus::Closed;
        if let Some(reason) = reason {
            self.notice = Some(format!("Disconnected: {reason}"));
        }
    }

    /// Reports a failed send. The input buffer is left untouched.
    pub fn send_failed(&mut self, error: &ChatError) {
        self.notice = Some(match error {
            ChatError::NotOpen { status } => {
                format!("Not sent: connection is {status}")
            }
            ChatError::Closing => "Not sent: connection is closing".to_string(),
            other => format!("Not sent: {other}"),
        });
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    /// Clears the input after a successful send.
    pub fn clear_input(&mut self) {
        self.input.clear();
        self.notice = None;
        self.scroll_offset = 0;
    }

    pub fn scroll_up(&mut self) {
        let max = self.records.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + SCROLL_STEP).min(max);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
    }

    /// Sets the quit flag.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Identity as shown in the header.
    pub fn identity_display(&self) -> &str {
        self.identity.as_ref().map_or("unassigned", |id| id.short())
    }
}

// ============================================================================
// Tests
// ============================================================================
