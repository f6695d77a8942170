//! Builder pattern for connection manager configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use live_notify::{ConnectionManager, ReconnectPolicy};
//!
//! # fn example() -> live_notify::Result<()> {
//! let manager = ConnectionManager::builder()
//!     .origin("http://127.0.0.1:8000/print-orders/")
//!     .policy(ReconnectPolicy::new().with_interval(Duration::from_secs(5)))
//!     .start()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use url::Url;

use crate::error::{Error, Result};
use crate::render::{Render, TracingRender};
use crate::router::{HandlerTable, MessageRouter};
use crate::transport::{Connector, WsConnector};

use super::core::ConnectionManager;
use super::endpoint::endpoint_url;
use super::options::{ClientOptions, ReconnectPolicy};

// ============================================================================
// ConnectionManagerBuilder
// ============================================================================

/// Builder for a [`ConnectionManager`].
///
/// Use [`ConnectionManager::builder()`] to create a new builder. Only
/// [`origin`](Self::origin) is required; everything else has a default:
///
/// | Setting | Default |
/// |---------|---------|
/// | options | [`ClientOptions::default()`] |
/// | render | [`TracingRender`] |
/// | handlers | [`HandlerTable::standard()`] |
/// | connector | [`WsConnector`] |
#[derive(Default)]
pub struct ConnectionManagerBuilder {
    /// Page origin the endpoint is derived from.
    origin: Option<String>,
    /// Client options.
    options: ClientOptions,
    /// Page collaborator.
    render: Option<Arc<dyn Render>>,
    /// Handler table.
    handlers: Option<HandlerTable>,
    /// Transport factory.
    connector: Option<Arc<dyn Connector>>,
}

impl ConnectionManagerBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL the hosting page was loaded from.
    ///
    /// Only its scheme, host and port are used.
    #[inline]
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Replaces all client options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn policy(mut self, policy: ReconnectPolicy) -> Self {
        self.options.policy = policy;
        self
    }

    /// Sets the heartbeat period.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.options.heartbeat_interval = interval;
        self
    }

    /// Sets the page collaborator.
    #[inline]
    #[must_use]
    pub fn render(mut self, render: impl Render + 'static) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Sets a shared page collaborator.
    #[inline]
    #[must_use]
    pub fn render_shared(mut self, render: Arc<dyn Render>) -> Self {
        self.render = Some(render);
        self
    }

    /// Sets the handler table.
    #[inline]
    #[must_use]
    pub fn handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Sets the transport factory.
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Validates the configuration, spawns the lifecycle task and issues
    /// the first connect.
    ///
    /// Connection failures after this point are handled internally and
    /// never reported here.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no origin is set, the origin has no host, the
    ///   options are invalid, or no tokio runtime is running
    /// - [`Error::Url`] if the origin cannot be parsed
    pub fn start(self) -> Result<ConnectionManager> {
        let origin = self
            .origin
            .as_deref()
            .ok_or_else(|| Error::config("Page origin is required"))?;
        let origin = Url::parse(origin)?;

        self.options.validate().map_err(Error::config)?;
        let endpoint = endpoint_url(&origin, &self.options.endpoint_path)?;

        Handle::try_current()
            .map_err(|_| Error::config("ConnectionManager must be started inside a tokio runtime"))?;

        let render = self.render.unwrap_or_else(|| Arc::new(TracingRender));
        let table = self.handlers.unwrap_or_else(HandlerTable::standard);
        let router = MessageRouter::new(table, Arc::clone(&render));
        let connector = self.connector.unwrap_or_else(|| Arc::new(WsConnector::new()));

        Ok(ConnectionManager::spawn(
            endpoint,
            &self.options,
            connector,
            router,
            render,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_origin() {
        let err = ConnectionManager::builder().start().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_unparseable_origin() {
        let err = ConnectionManager::builder()
            .origin("not a url")
            .start()
            .unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn test_invalid_options() {
        let err = ConnectionManager::builder()
            .origin("http://localhost/")
            .policy(ReconnectPolicy::new().with_max_attempts(0))
            .start()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_requires_runtime() {
        let err = ConnectionManager::builder()
            .origin("http://localhost/")
            .start()
            .unwrap_err();
        assert!(err.to_string().contains("tokio runtime"));
    }

    #[tokio::test]
    async fn test_endpoint_derived_from_origin() {
        let manager = ConnectionManager::builder()
            .origin("http://127.0.0.1:9/index/")
            .start()
            .expect("valid configuration");
        assert_eq!(manager.endpoint().as_str(), "ws://127.0.0.1:9/ws/notifications/");
        manager.shutdown();
    }
}
