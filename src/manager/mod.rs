//! Connection lifecycle management.
//!
//! # Lifecycle
//!
//! 1. [`ConnectionManager::builder()`] - configure origin, policy, render
//! 2. `start()` - spawn the lifecycle task, first connect
//! 3. Open → frames routed, heartbeat every 30 s
//! 4. Close → fixed-delay reconnect until the attempt cap, then `Failed`
//! 5. [`ConnectionManager::shutdown`] - release the link, cancel timers
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent configuration |
//! | `core` | Handle and lifecycle task |
//! | `endpoint` | Endpoint URL derivation |
//! | `machine` | Pure lifecycle state machine |
//! | `options` | Reconnect policy and client options |

// ============================================================================
// Submodules
// ============================================================================

/// Builder for configuring a connection manager.
pub mod builder;

/// Connection manager handle and lifecycle task.
pub mod core;

/// Endpoint derivation from the page origin.
pub mod endpoint;

/// Lifecycle state machine.
pub mod machine;

/// Reconnect policy and client options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ConnectionManagerBuilder;
pub use self::core::{ConnectionManager, FAILURE_MESSAGE, Snapshot};
pub use endpoint::endpoint_url;
pub use machine::{ConnectionState, Effect, Input, LifecycleMachine};
pub use options::{
    ClientOptions, DEFAULT_ENDPOINT_PATH, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL, ReconnectPolicy,
};
