//! Envelope decoding and message kind tags.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value, from_str, json};

use crate::error::{Error, Result};

// ============================================================================
// Kind Tags
// ============================================================================

/// Type tags understood by the standard handler table.
pub mod kind {
    /// Server greeting after the handshake.
    pub const CONNECTION_ESTABLISHED: &str = "connection_established";
    /// Order created, updated or deleted.
    pub const ORDER_NOTIFICATION: &str = "order_notification";
    /// Progress step created, updated or deleted.
    pub const PROGRESS_NOTIFICATION: &str = "progress_notification";
    /// Dashboard counters changed.
    pub const DASHBOARD_UPDATE: &str = "dashboard_update";
    /// Free-form notification with its own severity.
    pub const GENERAL_NOTIFICATION: &str = "general_notification";
    /// Server-side alias of [`GENERAL_NOTIFICATION`].
    pub const NOTIFICATION_MESSAGE: &str = "notification_message";
    /// Heartbeat reply.
    pub const PONG: &str = "pong";
    /// Server rejected something we sent.
    pub const ERROR: &str = "error";
    /// Outbound heartbeat.
    pub const PING: &str = "ping";
}

// ============================================================================
// Envelope
// ============================================================================

/// A decoded inbound message.
///
/// # Format
///
/// ```json
/// { "type": "order_notification", "data": { "action": "created", ... } }
/// ```
///
/// Some server messages (`connection_established`, `error`) carry their
/// fields at the top level instead of under `data`. When `data` is absent
/// the remaining top-level fields become the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Type tag used for handler lookup.
    #[serde(rename = "type")]
    pub kind: String,

    /// Kind-specific payload.
    pub data: Value,
}

impl Envelope {
    /// Creates a new envelope.
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Decodes an inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPayload`] if the frame is not a JSON object
    /// with a string `type` field.
    pub fn decode(text: &str) -> Result<Self> {
        let mut fields: Map<String, Value> =
            from_str(text).map_err(|e| Error::malformed_payload(e.to_string()))?;

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(_) => return Err(Error::malformed_payload("`type` must be a string")),
            None => return Err(Error::malformed_payload("missing `type` field")),
        };

        let data = match fields.remove("data") {
            Some(data) => data,
            None => Value::Object(fields),
        };

        Ok(Self { kind, data })
    }
}

// ============================================================================
// Outbound Frames
// ============================================================================

/// Returns the serialized heartbeat frame, `{"type":"ping"}`.
#[must_use]
pub fn heartbeat_frame() -> String {
    json!({ "type": kind::PING }).to_string()
}

// ============================================================================
// Tests
// ============================================================================
