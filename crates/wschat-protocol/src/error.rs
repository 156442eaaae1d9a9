//! Protocol error types.

use thiserror::Error;

/// Errors raised while decoding or encoding wire payloads.
///
/// Decoding errors are never fatal to a session: callers log them and drop
/// the offending frame.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Payload is not valid JSON.
    #[error("Malformed JSON payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Payload is valid JSON but not an object.
    #[error("Expected a JSON object, got {kind}")]
    NotAnObject {
        /// JSON type that was received instead.
        kind: &'static str,
    },

    /// A known field carries a value of the wrong type.
    #[error("Invalid field in payload: {0}")]
    InvalidField(#[source] serde_json::Error),

    /// A frame could not be serialized.
    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Names the JSON type of a value for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_an_object_display() {
        let err = ProtocolError::NotAnObject { kind: "array" };
        assert_eq!(err.to_string(), "Expected a JSON object, got array");
    }

    #[test]
    fn test_malformed_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err = ProtocolError::Malformed(json_err);
        assert!(err.to_string().contains("Malformed JSON payload"));
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&serde_json::json!(null)), "null");
        assert_eq!(json_kind(&serde_json::json!([1, 2])), "array");
        assert_eq!(json_kind(&serde_json::json!("s")), "string");
        assert_eq!(json_kind(&serde_json::json!({})), "object");
    }
}
