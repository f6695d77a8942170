//! live-notify - Real-time notification channel client.
//!
//! Keeps one persistent WebSocket to the application server, routes typed
//! push messages to handlers, and keeps a connection indicator in sync.
//!
//! # Architecture
//!
//! - **[`ConnectionManager`]**: owns the link, the reconnect policy and the
//!   heartbeat. Lifecycle decisions are made by a pure
//!   [`LifecycleMachine`]; a single tokio task executes them.
//! - **[`MessageRouter`]**: maps an envelope's `type` to a handler. It
//!   knows nothing about the transport.
//! - **[`Render`]**: the page-side collaborator. Everything visible goes
//!   through it.
//!
//! Key behaviours:
//!
//! - Fixed-delay reconnect, capped; exhaustion shows one error notification
//! - `{"type":"ping"}` every 30 s while connected, no pong tracking
//! - Malformed frames and unknown types are logged and dropped
//! - Callbacks from superseded links are ignored by generation
//!
//! # Quick Start
//!
//! ```no_run
//! use live_notify::{ConnectionManager, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = ConnectionManager::builder()
//!         .origin("https://crm.example.com/print-orders/")
//!         .start()?;
//!
//!     let _ = tokio::signal::ctrl_c().await;
//!     manager.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`manager`] | Connection lifecycle, options, builder |
//! | [`router`] | Envelope dispatch and standard handlers |
//! | [`render`] | Render collaborator contract |
//! | [`protocol`] | Wire message types |
//! | [`transport`] | Transport abstraction and WebSocket link |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Connection lifecycle management.
///
/// Use [`ConnectionManager::builder()`] to start a channel.
pub mod manager;

/// Envelope dispatch.
pub mod router;

/// Render collaborator contract.
pub mod render;

/// Wire message types.
pub mod protocol;

/// Transport layer.
///
/// Implement [`transport::Connector`] to substitute the WebSocket link.
pub mod transport;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

// ============================================================================
// Re-exports
// ============================================================================

// Manager types
pub use manager::{
    ClientOptions, ConnectionManager, ConnectionManagerBuilder, ConnectionState,
    LifecycleMachine, ReconnectPolicy, Snapshot,
};

// Router types
pub use router::{Dispatch, Handler, HandlerTable, MessageRouter};

// Render types
pub use render::{DashboardFields, Render, Severity, TracingRender, ViewScope};

// Protocol types
pub use protocol::Envelope;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::Generation;
