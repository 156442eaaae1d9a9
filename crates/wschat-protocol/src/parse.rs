//! Parsing of raw JSON payloads.
//!
//! The server schema is open: unknown fields are ignored, and every known
//! field is optional. Empty strings in `connectionId` and `message` count as
//! absent, so a frame like `{"message":""}` produces no record.

use serde::Deserialize;
use serde_json::Value;
use wschat_core::ConnectionId;

use crate::error::{json_kind, ProtocolError, ProtocolResult};
use crate::message::{Action, InboundFrame, RelayRequest, EMPTY_MESSAGE_PLACEHOLDER};

/// Raw server payload as it appears on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInboundFrame {
    #[serde(default, rename = "connectionId")]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
}

impl RawInboundFrame {
    /// Normalizes the raw payload into an [`InboundFrame`].
    pub fn into_frame(self) -> InboundFrame {
        InboundFrame {
            connection_id: non_empty(self.connection_id).map(ConnectionId::new),
            message: non_empty(self.message),
            from: self.from,
        }
    }
}

/// Raw client request as it appears on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRequest {
    #[serde(default)]
    pub action: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RawRequest {
    /// Performs route selection on the `action` field.
    pub fn into_request(self) -> RelayRequest {
        let action = match self.action {
            Some(Value::String(action)) => Some(action),
            Some(other) => Some(other.to_string()),
            None => None,
        };

        match action.as_deref() {
            Some(name) if name == Action::SendMessage.as_str() => RelayRequest::SendMessage {
                data: match self.data {
                    None | Some(Value::Null) => EMPTY_MESSAGE_PLACEHOLDER.to_string(),
                    Some(Value::String(text)) => text,
                    Some(other) => other.to_string(),
                },
            },
            _ => RelayRequest::Unrouted { action },
        }
    }
}

/// Parses a text frame received by the client.
///
/// # Errors
///
/// - `ProtocolError::Malformed` if `raw` is not JSON
/// - `ProtocolError::NotAnObject` if it is JSON but not an object
/// - `ProtocolError::InvalidField` if a known field is not a string
pub fn parse_inbound(raw: &str) -> ProtocolResult<InboundFrame> {
    let value = parse_object(raw)?;
    let frame: RawInboundFrame =
        serde_json::from_value(value).map_err(ProtocolError::InvalidField)?;
    Ok(frame.into_frame())
}

/// Parses a text frame received by the relay and selects its route.
///
/// # Errors
///
/// - `ProtocolError::Malformed` if `raw` is not JSON
/// - `ProtocolError::NotAnObject` if it is JSON but not an object
pub fn parse_request(raw: &str) -> ProtocolResult<RelayRequest> {
    let value = parse_object(raw)?;
    let request: RawRequest =
        serde_json::from_value(value).map_err(ProtocolError::InvalidField)?;
    Ok(request.into_request())
}

fn parse_object(raw: &str) -> ProtocolResult<Value> {
    let value: Value = serde_json::from_str(raw).map_err(ProtocolError::Malformed)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(ProtocolError::NotAnObject {
            kind: json_kind(&value),
        })
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}
