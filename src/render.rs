//! Render collaborator contract.
//!
//! The channel never touches the page itself. Every visible effect goes
//! through the [`Render`] trait, implemented by the embedding application.
//!
//! # Operations
//!
//! | Method | Called by |
//! |--------|-----------|
//! | [`Render::show_notification`] | handlers, reconnect exhaustion |
//! | [`Render::request_view_refresh`] | order, progress, dashboard handlers |
//! | [`Render::update_connection_indicator`] | connection lifecycle |
//! | [`Render::update_dashboard_fields`] | dashboard handler |

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tracing::{error, info};

// ============================================================================
// Constants
// ============================================================================

/// Delay a render implementation should wait before acting on a refresh
/// hint, so the accompanying notification is seen first.
pub const SUGGESTED_REFRESH_DELAY: Duration = Duration::from_secs(1);

// ============================================================================
// Severity
// ============================================================================

/// Notification severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Informational.
    #[default]
    Info,
    /// Positive outcome.
    Success,
    /// Failure the user should act on.
    Error,
}

impl Severity {
    /// Parses a wire severity. Unknown values fall back to [`Severity::Info`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "success" => Self::Success,
            "error" | "danger" => Self::Error,
            _ => Self::Info,
        }
    }

    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ViewScope
// ============================================================================

/// Which part of the application a refresh hint concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewScope {
    /// Order lists.
    Orders,
    /// Progress step lists.
    Progress,
    /// Dashboard counters.
    Dashboard,
}

impl ViewScope {
    /// Page path fragments on which this scope is displayed.
    #[must_use]
    pub const fn paths(self) -> &'static [&'static str] {
        match self {
            Self::Orders => &["/print-orders/", "/index/"],
            Self::Progress => &["/progress/", "/print-orders/", "/index/", "/print-dashboard/"],
            Self::Dashboard => &["/print-dashboard/", "/index/"],
        }
    }

    /// Returns `true` if a page at `path` shows data for this scope.
    #[must_use]
    pub fn applies_to(self, path: &str) -> bool {
        self.paths().iter().any(|fragment| path.contains(fragment))
    }
}

// ============================================================================
// Render
// ============================================================================

/// Dashboard field name to display value.
pub type DashboardFields = BTreeMap<String, String>;

/// Page-side collaborator.
///
/// Implementations decide how (and whether) to act on each call. They are
/// invoked from the connection task and must not block.
pub trait Render: Send + Sync {
    /// Shows a transient notification.
    fn show_notification(&self, message: &str, severity: Severity);

    /// Hints that the view for `scope` is out of date.
    fn request_view_refresh(&self, scope: ViewScope);

    /// Reflects the connection status.
    fn update_connection_indicator(&self, connected: bool);

    /// Writes dashboard counters. Only fields present in the update are
    /// included.
    fn update_dashboard_fields(&self, fields: &DashboardFields);

    /// Path of the page being rendered, if known.
    ///
    /// Scope-limited announcements are skipped when the path does not
    /// match. `None` means every scope applies.
    fn page_path(&self) -> Option<String> {
        None
    }
}

// ============================================================================
// TracingRender
// ============================================================================

/// [`Render`] implementation that only logs.
///
/// Used when no page collaborator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRender;

impl Render for TracingRender {
    fn show_notification(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(%severity, message, "Notification"),
            _ => info!(%severity, message, "Notification"),
        }
    }

    fn request_view_refresh(&self, scope: ViewScope) {
        info!(?scope, "View refresh requested");
    }

    fn update_connection_indicator(&self, connected: bool) {
        info!(connected, "Connection indicator");
    }

    fn update_dashboard_fields(&self, fields: &DashboardFields) {
        info!(?fields, "Dashboard fields");
    }
}

// ============================================================================
// Test Support
// ============================================================================

#[cfg(test)]
pub(crate) mod recording {
    use parking_lot::Mutex;

    use super::*;

    /// One collaborator call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Notify(String, Severity),
        Refresh(ViewScope),
        Indicator(bool),
        Dashboard(DashboardFields),
    }

    /// Records every call in order.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRender {
        calls: Mutex<Vec<Call>>,
        path: Option<String>,
    }

    impl RecordingRender {
        pub(crate) fn at(path: &str) -> Self {
            Self {
                calls: Mutex::default(),
                path: Some(path.to_string()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }
    }

    impl Render for RecordingRender {
        fn show_notification(&self, message: &str, severity: Severity) {
            self.calls.lock().push(Call::Notify(message.to_string(), severity));
        }

        fn request_view_refresh(&self, scope: ViewScope) {
            self.calls.lock().push(Call::Refresh(scope));
        }

        fn update_connection_indicator(&self, connected: bool) {
            self.calls.lock().push(Call::Indicator(connected));
        }

        fn update_dashboard_fields(&self, fields: &DashboardFields) {
            self.calls.lock().push(Call::Dashboard(fields.clone()));
        }

        fn page_path(&self) -> Option<String> {
            self.path.clone()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
