//! Transport layer.
//!
//! The lifecycle code never talks to a socket directly. It asks a
//! [`Connector`] for a new link and receives that link's open, message,
//! close and error callbacks as [`TransportEvent`]s on a channel, each
//! tagged with the [`Generation`] it belongs to.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   open(url, gen, tx)  ┌────────────────────┐
//! │  ConnectionManager   │──────────────────────►│  Connector         │
//! │  (lifecycle task)    │                       │  → TransportHandle │
//! │                      │◄──────────────────────│  (link task)       │
//! └──────────────────────┘   TransportEvent      └────────────────────┘
//! ```
//!
//! # Link Guarantees
//!
//! - `Open` is emitted at most once, before any `Message`.
//! - `Closed` is emitted exactly once, last; an `Error` is always followed
//!   by a `Closed`.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket link over tokio-tungstenite |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket link and connector.
pub mod connection;

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::Generation;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, DEFAULT_HANDSHAKE_TIMEOUT, WsConnector};

// ============================================================================
// Events
// ============================================================================

/// Callback from a transport link.
#[derive(Debug)]
pub enum TransportSignal {
    /// Handshake completed.
    Open,
    /// Inbound text frame.
    Message(String),
    /// Transport failed. A `Closed` follows.
    Error(Error),
    /// Link is gone.
    Closed {
        /// Close reason, if the peer sent one.
        reason: Option<String>,
    },
}

/// A [`TransportSignal`] tagged with the link that produced it.
#[derive(Debug)]
pub struct TransportEvent {
    /// Link identity.
    pub generation: Generation,
    /// What happened.
    pub signal: TransportSignal,
}

impl TransportEvent {
    /// Creates a new event.
    #[inline]
    #[must_use]
    pub const fn new(generation: Generation, signal: TransportSignal) -> Self {
        Self { generation, signal }
    }
}

/// Channel on which links report their callbacks.
pub type EventSender = mpsc::UnboundedSender<TransportEvent>;

// ============================================================================
// Traits
// ============================================================================

/// Live link owned by the connection manager.
pub trait TransportHandle: Send {
    /// Queues a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`](crate::Error::ConnectionClosed)
    /// if the link is gone.
    fn send_text(&self, text: String) -> Result<()>;

    /// Closes the link. Safe to call more than once.
    fn close(&self);
}

/// Factory for transport links.
///
/// `open` must return without waiting for the handshake; progress is
/// reported through `events`.
pub trait Connector: Send + Sync + 'static {
    /// Starts a link to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportConstruction`](crate::Error::TransportConstruction)
    /// if the link cannot even be started.
    fn open(
        &self,
        url: &Url,
        generation: Generation,
        events: EventSender,
    ) -> Result<Box<dyn TransportHandle>>;
}
