//! Envelope dispatch.
//!
//! [`MessageRouter`] maps an envelope's type tag to a handler. It knows
//! nothing about the transport: the connection task decodes frames and
//! passes envelopes in, one at a time, in delivery order.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `handlers` | Handlers for the standard message kinds |

// ============================================================================
// Submodules
// ============================================================================

/// Handlers for the standard message kinds.
pub mod handlers;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::protocol::{Envelope, kind};
use crate::render::Render;

// ============================================================================
// Types
// ============================================================================

/// Handler callback.
///
/// Receives the envelope's `data` and the render collaborator.
pub type Handler = Box<dyn Fn(&Value, &dyn Render) -> Result<()> + Send + Sync>;

// ============================================================================
// HandlerTable
// ============================================================================

/// Type tag to handler mapping.
///
/// Built once and moved into a [`MessageRouter`]; the router offers no way
/// to change it afterwards.
#[derive(Default)]
pub struct HandlerTable {
    handlers: FxHashMap<String, Handler>,
}

impl HandlerTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the table for the standard message kinds.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with(kind::CONNECTION_ESTABLISHED, handlers::connection_established)
            .with(kind::ORDER_NOTIFICATION, handlers::order_notification)
            .with(kind::PROGRESS_NOTIFICATION, handlers::progress_notification)
            .with(kind::DASHBOARD_UPDATE, handlers::dashboard_update)
            .with(kind::GENERAL_NOTIFICATION, handlers::general_notification)
            .with(kind::NOTIFICATION_MESSAGE, handlers::general_notification)
            .with(kind::PONG, handlers::pong)
            .with(kind::ERROR, handlers::server_error)
    }

    /// Registers `handler` for `kind`, replacing any previous entry.
    #[must_use]
    pub fn with<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Value, &dyn Render) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(kind.into(), Box::new(handler));
        self
    }

    /// Returns `true` if `kind` has a handler.
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Number of registered kinds.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no kind is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("HandlerTable").field("kinds", &kinds).finish()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Outcome of [`MessageRouter::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler ran to completion.
    Handled,
    /// A handler ran but rejected the payload.
    Rejected,
    /// No handler is registered for the type tag.
    Unknown,
}

// ============================================================================
// MessageRouter
// ============================================================================

/// Routes envelopes to handlers.
pub struct MessageRouter {
    /// Fixed handler table.
    table: HandlerTable,
    /// Page collaborator passed to every handler.
    render: Arc<dyn Render>,
}

impl MessageRouter {
    /// Creates a router over `table`.
    #[must_use]
    pub fn new(table: HandlerTable, render: Arc<dyn Render>) -> Self {
        debug!(kinds = table.len(), "Message router ready");
        Self { table, render }
    }

    /// Creates a router with the standard handler table.
    #[must_use]
    pub fn standard(render: Arc<dyn Render>) -> Self {
        Self::new(HandlerTable::standard(), render)
    }

    /// Returns `true` if `kind` has a handler.
    #[inline]
    #[must_use]
    pub fn handles(&self, kind: &str) -> bool {
        self.table.contains(kind)
    }

    /// Dispatches one envelope.
    ///
    /// Unknown type tags are logged and dropped. Handler failures are
    /// logged; neither is surfaced to the caller as an error.
    pub fn dispatch(&self, envelope: &Envelope) -> Dispatch {
        let Some(handler) = self.table.handlers.get(&envelope.kind) else {
            info!(kind = %envelope.kind, ?envelope, "Unknown message type");
            return Dispatch::Unknown;
        };

        match handler(&envelope.data, self.render.as_ref()) {
            Ok(()) => {
                debug!(kind = %envelope.kind, "Message dispatched");
                Dispatch::Handled
            }
            Err(e) if e.is_payload_error() => {
                warn!(kind = %envelope.kind, error = %e, "Handler rejected message");
                Dispatch::Rejected
            }
            Err(e) => {
                error!(kind = %envelope.kind, error = %e, "Handler failed");
                Dispatch::Rejected
            }
        }
    }
}

impl fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRouter")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::render::recording::{Call, RecordingRender};
    use crate::render::{Severity, ViewScope};

    fn router() -> (MessageRouter, Arc<RecordingRender>) {
        let render = Arc::new(RecordingRender::default());
        (MessageRouter::standard(render.clone()), render)
    }

    #[test]
    fn test_standard_table_kinds() {
        let table = HandlerTable::standard();
        for kind in [
            kind::CONNECTION_ESTABLISHED,
            kind::ORDER_NOTIFICATION,
            kind::PROGRESS_NOTIFICATION,
            kind::DASHBOARD_UPDATE,
            kind::GENERAL_NOTIFICATION,
        ] {
            assert!(table.contains(kind), "missing handler for {kind}");
        }
        assert!(!table.contains(kind::PING));
    }

    #[test]
    fn test_order_created_dispatch() {
        let (router, render) = router();
        let envelope = Envelope::decode(
            r#"{"type":"order_notification","data":{"action":"created","order_no":"X1","customer_name":"Acme"}}"#,
        )
        .expect("valid envelope");

        assert_eq!(router.dispatch(&envelope), Dispatch::Handled);

        let calls = render.calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Notify(message, severity) => {
                assert!(message.contains("X1"));
                assert!(message.contains("Acme"));
                assert_eq!(*severity, Severity::Info);
            }
            other => panic!("expected notification, got {other:?}"),
        }
        assert_eq!(calls[1], Call::Refresh(ViewScope::Orders));
    }

    #[test]
    fn test_unknown_type_has_no_side_effects() {
        let (router, render) = router();
        let envelope = Envelope::new("inventory_update", json!({ "sku": "A" }));

        assert_eq!(router.dispatch(&envelope), Dispatch::Unknown);
        assert!(render.calls().is_empty());
    }

    #[test]
    fn test_invalid_payload_is_rejected_quietly() {
        let (router, render) = router();
        let envelope = Envelope::new(kind::ORDER_NOTIFICATION, json!({ "action": "created" }));

        assert_eq!(router.dispatch(&envelope), Dispatch::Rejected);
        assert!(render.calls().is_empty());
    }

    #[test]
    fn test_custom_table() {
        let render = Arc::new(RecordingRender::default());
        let table = HandlerTable::new().with("shipment", |data: &Value, render: &dyn Render| {
            let carrier = data["carrier"].as_str().unwrap_or_default();
            render.show_notification(&format!("Shipped via {carrier}"), Severity::Success);
            Ok(())
        });
        let router = MessageRouter::new(table, render.clone());

        let envelope = Envelope::new("shipment", json!({ "carrier": "DHL" }));
        assert_eq!(router.dispatch(&envelope), Dispatch::Handled);
        assert_eq!(
            render.calls(),
            vec![Call::Notify("Shipped via DHL".into(), Severity::Success)]
        );
        assert!(!router.handles(kind::ORDER_NOTIFICATION));
    }

    #[test]
    fn test_debug_lists_kinds() {
        let table = HandlerTable::new().with("b", handlers::pong).with("a", handlers::pong);
        assert_eq!(format!("{table:?}"), r#"HandlerTable { kinds: ["a", "b"] }"#);
    }
}
