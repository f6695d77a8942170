//! Error types for the notification channel.
//!
//! The lifecycle runtime never hands these errors back to the embedding
//! code: transport and payload failures are logged and drive the connection
//! state machine. Only configuration problems detected while building a
//! [`ConnectionManager`](crate::ConnectionManager) are returned.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Url`] |
//! | Connection | [`Error::TransportConstruction`], [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Payload | [`Error::MalformedPayload`], [`Error::InvalidPayload`] |
//! | Outbound | [`Error::SendWhileDisconnected`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client options or the page origin are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Page origin or endpoint could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport could not be constructed.
    ///
    /// Treated exactly like a close: it feeds the reconnect accounting.
    #[error("Transport construction failed: {message}")]
    TransportConstruction {
        /// Description of the failure.
        message: String,
    },

    /// Transport reported an error on a live connection.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// WebSocket handshake did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    /// Transport is gone.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Payload Errors
    // ========================================================================
    /// Inbound frame is not a JSON envelope.
    #[error("Malformed payload: {message}")]
    MalformedPayload {
        /// Decoder error message.
        message: String,
    },

    /// Envelope data does not match the shape its handler expects.
    #[error("Invalid {kind} payload: {message}")]
    InvalidPayload {
        /// Envelope type tag.
        kind: String,
        /// Decoder error message.
        message: String,
    },

    // ========================================================================
    // Outbound Errors
    // ========================================================================
    /// `send()` was called while no connection is open.
    #[error("Cannot send while disconnected")]
    SendWhileDisconnected,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a transport construction error.
    #[inline]
    pub fn transport_construction(message: impl Into<String>) -> Self {
        Self::TransportConstruction {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a malformed payload error.
    #[inline]
    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Creates an invalid payload error for the given envelope type.
    #[inline]
    pub fn invalid_payload(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::TransportConstruction { .. }
                | Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a payload error.
    ///
    /// Payload errors drop a single frame and never affect the connection.
    #[inline]
    #[must_use]
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload { .. } | Self::InvalidPayload { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("reset by peer");
        assert_eq!(err.to_string(), "Connection failed: reset by peer");
    }

    #[test]
    fn test_invalid_payload_display() {
        let err = Error::invalid_payload("order_notification", "missing field `order_no`");
        assert_eq!(
            err.to_string(),
            "Invalid order_notification payload: missing field `order_no`"
        );
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::transport_construction("bad scheme").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
        assert!(!Error::SendWhileDisconnected.is_connection_error());
    }

    #[test]
    fn test_is_payload_error() {
        assert!(Error::malformed_payload("eof").is_payload_error());
        assert!(!Error::ConnectionClosed.is_payload_error());
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::ConnectionTimeout { timeout_ms: 10000 };
        assert_eq!(err.to_string(), "Connection timeout after 10000ms");
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_from_websocket_error() {
        let err: Error = WsError::ConnectionClosed.into();
        assert!(matches!(err, Error::WebSocket(_)));
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::Url(_)));
    }
}
