//! Wire message types.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Shape |
//! |---------|-----------|-------|
//! | [`Envelope`] | Server → Client | `{"type": "...", "data": {...}}` |
//! | Heartbeat | Client → Server | `{"type": "ping"}` |
//! | Caller message | Client → Server | any JSON object with a `type` field |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Envelope decoding, type tags, heartbeat frame |
//! | `payload` | Typed `data` shapes for each recognised kind |

// ============================================================================
// Submodules
// ============================================================================

/// Envelope type and message kind tags.
pub mod envelope;

/// Typed payloads carried in `Envelope::data`.
pub mod payload;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{Envelope, heartbeat_frame, kind};
pub use payload::{
    DASHBOARD_FIELDS, DashboardStats, GeneralNotification, OrderNotification,
    ProgressNotification, ServerError,
};
