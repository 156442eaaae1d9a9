//! wschat Protocol - Wire protocol for chat communication
//!
//! This crate provides frame types and parsing for communication between
//! the chat client and the relay: JSON text frames over a WebSocket.

pub mod error;
pub mod message;
pub mod parse;

pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    Action, InboundFrame, OutboundFrame, RelayRequest, ServerFrame, EMPTY_MESSAGE_PLACEHOLDER,
};
pub use parse::{parse_inbound, parse_request, RawInboundFrame, RawRequest};
