//! wschat client - session connection, message routing and terminal UI
//!
//! # Architecture
//!
//! The client is event-driven:
//!
//! 1. **SessionConnection**: owns the WebSocket, runs the transport on its own
//!    task, and reports `Opened`/`Message`/`Closed` events on a channel
//! 2. **MessageRouter**: owns the session identity and the message log;
//!    attributes each inbound message to this session or to another one
//! 3. **ChatClient**: pairs the two and yields `ClientUpdate`s for a front end
//!
//! The terminal front end (`app`, `input`, `ui`) is one such collaborator.

pub mod app;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod input;
pub mod router;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use client::{ChatClient, ClientUpdate};
pub use config::ChatConfig;
pub use connection::{ConnectionEvent, ConnectionHandle, FrameSink, SessionConnection};
pub use error::{ChatError, Result};
pub use router::{MessageRouter, Routed, SendOutcome};
