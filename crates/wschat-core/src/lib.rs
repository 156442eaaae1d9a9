//! wschat Core - Shared types for the chat client and relay
//!
//! This crate provides the domain types shared between the client
//! (`wschat-client`) and the development relay (`wschat-relay`).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()` or `todo!()` outside tests.

pub mod identity;
pub mod record;
pub mod status;

// Re-exports for convenience
pub use identity::{ConnectionId, SessionIdentity};
pub use record::{DisplayRecord, MessageLog, Origin};
pub use status::ConnectionStatus;
