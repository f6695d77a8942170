//! Typed payloads for the recognised message kinds.
//!
//! Each type also owns the wording of its notification so handlers stay a
//! thin decode → render step.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::render::{DashboardFields, Severity};

// ============================================================================
// Constants
// ============================================================================

/// Dashboard counters the server publishes.
pub const DASHBOARD_FIELDS: [&str; 7] = [
    "total_orders",
    "pending_orders",
    "processing_orders",
    "completed_orders",
    "current_steps_count",
    "next_steps_count",
    "urgent_orders_count",
];

// ============================================================================
// Decoding Helpers
// ============================================================================

/// Decodes `data` into a payload type, tagging failures with `kind`.
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(kind: &str, data: &Value) -> Result<T> {
    T::deserialize(data).map_err(|e| Error::invalid_payload(kind, e.to_string()))
}

/// Renders a JSON scalar the way a page would print it.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Accepts identifiers sent either as strings or numbers.
fn lenient_string<'de, D>(deserializer: D) -> StdResult<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| display_value(&value))
}

fn join_detail(head: String, detail: Option<&str>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!("{head} - {detail}"),
        _ => head,
    }
}

// ============================================================================
// OrderNotification
// ============================================================================

/// `order_notification` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderNotification {
    /// `created`, `updated` or `deleted`.
    pub action: String,
    /// Order number shown to users.
    #[serde(deserialize_with = "lenient_string")]
    pub order_no: String,
    /// Customer name, sent on create and update.
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Human-readable status.
    #[serde(default)]
    pub status_display: Option<String>,
}

impl OrderNotification {
    /// Notification text, or `None` for an unrecognised action.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let no = &self.order_no;
        match self.action.as_str() {
            "created" => Some(join_detail(
                format!("New order created: {no}"),
                self.customer_name.as_deref(),
            )),
            "updated" => Some(join_detail(
                format!("Order updated: {no}"),
                self.status_display.as_deref(),
            )),
            "deleted" => Some(format!("Order deleted: {no}")),
            _ => None,
        }
    }
}

// ============================================================================
// ProgressNotification
// ============================================================================

/// `progress_notification` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressNotification {
    /// `created`, `updated` or `deleted`.
    pub action: String,
    /// Order the step belongs to.
    #[serde(deserialize_with = "lenient_string")]
    pub order_no: String,
    /// Step name.
    #[serde(default)]
    pub step_name: Option<String>,
    /// Human-readable step status.
    #[serde(default)]
    pub status_display: Option<String>,
}

impl ProgressNotification {
    /// Notification text, or `None` for an unrecognised action.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let no = &self.order_no;
        let step = self.step_name.as_deref();
        match self.action.as_str() {
            "created" => Some(join_detail(format!("New progress step: {no}"), step)),
            "updated" => {
                let head = join_detail(format!("Progress updated: {no}"), step);
                Some(match self.status_display.as_deref() {
                    Some(status) if !status.is_empty() => format!("{head} ({status})"),
                    _ => head,
                })
            }
            "deleted" => Some(join_detail(format!("Progress step removed: {no}"), step)),
            _ => None,
        }
    }
}

// ============================================================================
// DashboardStats
// ============================================================================

/// `dashboard_update` payload.
///
/// Only the known counters are kept; absent counters are left untouched on
/// the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    fields: DashboardFields,
}

impl DashboardStats {
    /// Extracts the known counters from `data`.
    #[must_use]
    pub fn from_data(data: &Value) -> Self {
        let fields = DASHBOARD_FIELDS
            .iter()
            .filter_map(|&name| {
                data.get(name)
                    .filter(|value| !value.is_null())
                    .map(|value| (name.to_string(), display_value(value)))
            })
            .collect();
        Self { fields }
    }

    /// Counters present in the update.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &DashboardFields {
        &self.fields
    }

    /// Returns `true` if no known counter was present.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// GeneralNotification
// ============================================================================

/// `general_notification` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneralNotification {
    /// Text to show.
    pub message: String,
    /// Wire severity (`info`, `success`, `error`).
    #[serde(rename = "type", default)]
    pub severity: Option<String>,
}

impl GeneralNotification {
    /// Parsed severity, defaulting to info.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity.as_deref().map(Severity::parse).unwrap_or_default()
    }
}

// ============================================================================
// ServerError
// ============================================================================

/// `error` payload, sent when the server could not parse our frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerError {
    /// Server-provided reason.
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
