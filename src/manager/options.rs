//! Reconnect policy and client options.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use live_notify::{ClientOptions, ReconnectPolicy};
//!
//! let options = ClientOptions::new()
//!     .with_policy(ReconnectPolicy::new().with_max_attempts(10))
//!     .with_heartbeat_interval(Duration::from_secs(15));
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Fixed delay between a close and the next connection attempt.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);

/// Consecutive failures tolerated before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Period of the keep-alive ping.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(30_000);

/// Path of the notification endpoint on the page's host.
pub const DEFAULT_ENDPOINT_PATH: &str = "/ws/notifications/";

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Fixed-delay, attempt-capped reconnection.
///
/// Immutable once the manager is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before each reconnect.
    pub interval: Duration,
    /// Number of reconnects tried before giving up. A close that finds
    /// `reconnect_attempts` at this value is terminal.
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Creates the default policy (3 s, 5 attempts).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: DEFAULT_RECONNECT_INTERVAL,
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }

    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the attempt cap.
    #[inline]
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Validates the policy.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("Reconnect interval must be greater than zero".to_string());
        }
        if self.max_attempts == 0 {
            return Err("Max reconnect attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ClientOptions
// ============================================================================

/// Connection manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Reconnect behaviour.
    pub policy: ReconnectPolicy,
    /// Heartbeat period.
    pub heartbeat_interval: Duration,
    /// Endpoint path appended to the page's host.
    pub endpoint_path: String,
}

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            policy: ReconnectPolicy::new(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
        }
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the heartbeat period.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the endpoint path.
    #[inline]
    #[must_use]
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        self.policy.validate()?;
        if self.heartbeat_interval.is_zero() {
            return Err("Heartbeat interval must be greater than zero".to_string());
        }
        if !self.endpoint_path.starts_with('/') {
            return Err(format!(
                "Endpoint path must start with '/': {}",
                self.endpoint_path
            ));
        }
        Ok(())
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.policy.interval, Duration::from_secs(3));
        assert_eq!(options.policy.max_attempts, 5);
        assert_eq!(options.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(options.endpoint_path, "/ws/notifications/");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let options = ClientOptions::new()
            .with_policy(
                ReconnectPolicy::new()
                    .with_interval(Duration::from_millis(500))
                    .with_max_attempts(2),
            )
            .with_heartbeat_interval(Duration::from_secs(10))
            .with_endpoint_path("/ws/alerts/");

        assert_eq!(options.policy.interval, Duration::from_millis(500));
        assert_eq!(options.policy.max_attempts, 2);
        assert_eq!(options.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(options.endpoint_path, "/ws/alerts/");
    }

    #[test]
    fn test_validate_zero_interval() {
        let policy = ReconnectPolicy::new().with_interval(Duration::ZERO);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let policy = ReconnectPolicy::new().with_max_attempts(0);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_zero_heartbeat() {
        let options = ClientOptions::new().with_heartbeat_interval(Duration::ZERO);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_relative_path() {
        let options = ClientOptions::new().with_endpoint_path("ws/notifications/");
        assert!(options.validate().is_err());
    }
}
