//! Handlers for the standard message kinds.
//!
//! Each handler decodes its payload, builds the notification text and calls
//! the render collaborator. They hold no state.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::protocol::payload::decode;
use crate::protocol::{
    DashboardStats, GeneralNotification, OrderNotification, ProgressNotification, ServerError,
    kind,
};
use crate::render::{Render, Severity, ViewScope};

// ============================================================================
// Constants
// ============================================================================

const CONNECTED_MESSAGE: &str = "Connected";
const DASHBOARD_MESSAGE: &str = "Dashboard data updated";

// ============================================================================
// Handlers
// ============================================================================

/// `connection_established`: confirms the channel to the user.
pub fn connection_established(data: &Value, render: &dyn Render) -> Result<()> {
    if let Some(user) = data.get("user").and_then(Value::as_str) {
        debug!(user, "Server greeted connection");
    }
    render.show_notification(CONNECTED_MESSAGE, Severity::Success);
    Ok(())
}

/// `order_notification`: announces the change and refreshes order views.
pub fn order_notification(data: &Value, render: &dyn Render) -> Result<()> {
    let order: OrderNotification = decode(kind::ORDER_NOTIFICATION, data)?;

    match order.message() {
        Some(message) => {
            render.show_notification(&message, Severity::Info);
            render.request_view_refresh(ViewScope::Orders);
        }
        None => warn!(action = %order.action, order_no = %order.order_no, "Unknown order action"),
    }
    Ok(())
}

/// `progress_notification`: announces the step change and refreshes
/// progress views.
pub fn progress_notification(data: &Value, render: &dyn Render) -> Result<()> {
    let progress: ProgressNotification = decode(kind::PROGRESS_NOTIFICATION, data)?;

    match progress.message() {
        Some(message) => {
            render.show_notification(&message, Severity::Info);
            render.request_view_refresh(ViewScope::Progress);
        }
        None => warn!(
            action = %progress.action,
            order_no = %progress.order_no,
            "Unknown progress action"
        ),
    }
    Ok(())
}

/// `dashboard_update`: writes the counters, then announces and refreshes
/// if the page shows the dashboard.
pub fn dashboard_update(data: &Value, render: &dyn Render) -> Result<()> {
    let stats = DashboardStats::from_data(data);

    if !stats.is_empty() {
        render.update_dashboard_fields(stats.fields());
    }

    let on_dashboard = render
        .page_path()
        .is_none_or(|path| ViewScope::Dashboard.applies_to(&path));
    if on_dashboard {
        render.show_notification(DASHBOARD_MESSAGE, Severity::Info);
        render.request_view_refresh(ViewScope::Dashboard);
    }
    Ok(())
}

/// `general_notification` / `notification_message`: shows the server's
/// text with the server's severity.
pub fn general_notification(data: &Value, render: &dyn Render) -> Result<()> {
    let note: GeneralNotification = decode(kind::GENERAL_NOTIFICATION, data)?;
    render.show_notification(&note.message, note.severity());
    Ok(())
}

/// `pong`: heartbeat reply. Nothing tracks it.
pub fn pong(_data: &Value, _render: &dyn Render) -> Result<()> {
    trace!("Heartbeat acknowledged");
    Ok(())
}

/// `error`: the server rejected one of our frames.
pub fn server_error(data: &Value, _render: &dyn Render) -> Result<()> {
    let report: ServerError = decode(kind::ERROR, data)?;
    warn!(
        message = report.message.as_deref().unwrap_or("unspecified"),
        "Server reported an error"
    );
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::render::recording::{Call, RecordingRender};

    #[test]
    fn test_connection_established() {
        let render = RecordingRender::default();
        connection_established(&json!({ "user": "amy" }), &render).expect("handled");
        assert_eq!(
            render.calls(),
            vec![Call::Notify(CONNECTED_MESSAGE.into(), Severity::Success)]
        );
    }

    #[test]
    fn test_order_deleted() {
        let render = RecordingRender::default();
        order_notification(&json!({ "action": "deleted", "order_no": "X9" }), &render)
            .expect("handled");
        assert_eq!(
            render.calls(),
            vec![
                Call::Notify("Order deleted: X9".into(), Severity::Info),
                Call::Refresh(ViewScope::Orders),
            ]
        );
    }

    #[test]
    fn test_order_unknown_action_is_silent() {
        let render = RecordingRender::default();
        order_notification(&json!({ "action": "merged", "order_no": "X9" }), &render)
            .expect("handled");
        assert!(render.calls().is_empty());
    }

    #[test]
    fn test_progress_created() {
        let render = RecordingRender::default();
        progress_notification(
            &json!({ "action": "created", "order_no": "X1", "step_name": "Cutting" }),
            &render,
        )
        .expect("handled");
        assert_eq!(
            render.calls(),
            vec![
                Call::Notify("New progress step: X1 - Cutting".into(), Severity::Info),
                Call::Refresh(ViewScope::Progress),
            ]
        );
    }

    #[test]
    fn test_dashboard_update() {
        let render = RecordingRender::default();
        dashboard_update(&json!({ "total_orders": 5, "pending_orders": 2 }), &render)
            .expect("handled");

        let calls = render.calls();
        assert_eq!(calls.len(), 3);
        match &calls[0] {
            Call::Dashboard(fields) => {
                assert_eq!(fields["total_orders"], "5");
                assert_eq!(fields["pending_orders"], "2");
            }
            other => panic!("expected dashboard fields, got {other:?}"),
        }
        assert_eq!(calls[2], Call::Refresh(ViewScope::Dashboard));
    }

    #[test]
    fn test_dashboard_update_off_dashboard_page_only_writes_fields() {
        let render = RecordingRender::at("/progress/");
        dashboard_update(&json!({ "urgent_orders_count": 1 }), &render).expect("handled");

        let calls = render.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Dashboard(fields) if fields["urgent_orders_count"] == "1"));
    }

    #[test]
    fn test_dashboard_update_on_index_page_announces() {
        let render = RecordingRender::at("/index/");
        dashboard_update(&json!({ "total_orders": 9 }), &render).expect("handled");

        assert_eq!(
            &render.calls()[1..],
            &[
                Call::Notify(DASHBOARD_MESSAGE.into(), Severity::Info),
                Call::Refresh(ViewScope::Dashboard),
            ]
        );
    }

    #[test]
    fn test_general_notification_uses_server_severity() {
        let render = RecordingRender::default();
        general_notification(&json!({ "message": "Backup failed", "type": "error" }), &render)
            .expect("handled");
        assert_eq!(
            render.calls(),
            vec![Call::Notify("Backup failed".into(), Severity::Error)]
        );
    }

    #[test]
    fn test_general_notification_requires_message() {
        let render = RecordingRender::default();
        assert!(general_notification(&json!({ "type": "info" }), &render).is_err());
    }

    #[test]
    fn test_pong_and_error_touch_nothing() {
        let render = RecordingRender::default();
        pong(&json!({ "message": "pong" }), &render).expect("handled");
        server_error(&json!({ "message": "invalid JSON" }), &render).expect("handled");
        assert!(render.calls().is_empty());
    }
}
