//! Client configuration.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::{ChatError, Result};

/// Endpoint used when none is configured (a local `wschat-relay`).
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:9001";

/// Default bound on the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait for the peer's reply to our close frame.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a chat session.
///
/// # Example
///
/// ```rust
/// use wschat_client::config::ChatConfig;
/// use std::time::Duration;
///
/// let config = ChatConfig::new("wss://chat.example.com/production")
///     .with_connect_timeout(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// WebSocket URL of the messaging endpoint.
    pub endpoint: String,

    /// How long the handshake may take before the session gives up and
    /// moves to `Closed`.
    pub connect_timeout: Duration,

    /// How long `close()` waits for the peer's close frame before the
    /// session gives up on it and moves to `Closed` anyway.
    pub close_timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl ChatConfig {
    /// Creates a configuration for `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Overrides the handshake timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Overrides the close handshake timeout.
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Checks that the endpoint is a WebSocket URL.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidEndpoint` unless the endpoint parses as a
    /// URL with a `ws` or `wss` scheme and a non-empty host.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url().map(|_| ())
    }

    /// Returns true if the endpoint requires TLS.
    pub fn is_secure(&self) -> bool {
        self.endpoint_url()
            .map(|url| url.scheme() == "wss")
            .unwrap_or(false)
    }

    /// Parses the endpoint into the URL the handshake connects to.
    ///
    /// # Errors
    ///
    /// Same as [`ChatConfig::validate`].
    pub fn endpoint_url(&self) -> Result<Url> {
        let invalid = || ChatError::InvalidEndpoint(self.endpoint.clone());

        let url = Url::parse(&self.endpoint).map_err(|e| {
            debug!(endpoint = %self.endpoint, error = %e, "Endpoint is not a URL");
            invalid()
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(invalid());
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(url),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_config_default() {
        let config = ChatConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.close_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_chat_config_custom() {
        let config = ChatConfig::new("wss://abc.execute-api.us-east-1.amazonaws.com/production/")
            .with_connect_timeout(Duration::from_millis(500))
            .with_close_timeout(Duration::from_millis(250));

        assert!(config.validate().is_ok());
        assert_eq!(config.close_timeout, Duration::from_millis(250));
        assert!(config.is_secure());
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        for endpoint in [
            "http://example.com",
            "example.com",
            "",
            "ws://",
            "ws://exa mple.com",
            "ws://?q",
            "ws://:::",
            "wss://host:notaport",
        ] {
            let config = ChatConfig::new(endpoint);
            assert!(
                matches!(config.validate(), Err(ChatError::InvalidEndpoint(_))),
                "expected {endpoint:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_validate_accepts_ports_paths_and_ipv6() {
        for endpoint in [
            "ws://127.0.0.1:9001",
            "ws://[::1]:9001/chat",
            "wss://chat.example.com/production?room=1",
        ] {
            assert!(
                ChatConfig::new(endpoint).validate().is_ok(),
                "expected {endpoint:?} to be accepted"
            );
        }
    }

    #[test]
    fn test_is_secure_follows_parsed_scheme() {
        assert!(ChatConfig::new("WSS://chat.example.com").is_secure());
        assert!(!ChatConfig::new("ws://chat.example.com").is_secure());
        assert!(!ChatConfig::new("wss://").is_secure());
    }
}
