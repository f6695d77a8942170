//! Endpoint derivation from the page origin.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Endpoint
// ============================================================================

/// Builds the notification endpoint for a page loaded from `origin`.
///
/// The scheme is `wss` iff the page was served over `https`; the host and
/// port are kept; the page path is replaced by `path`.
///
/// # Errors
///
/// Returns [`Error::Config`] if the origin has no host.
pub fn endpoint_url(origin: &Url, path: &str) -> Result<Url> {
    let host = origin
        .host_str()
        .ok_or_else(|| Error::config(format!("Page origin has no host: {origin}")))?;

    let scheme = match origin.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };

    let authority = match origin.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    Ok(Url::parse(&format!("{scheme}://{authority}{path}"))?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(origin: &str) -> Result<Url> {
        endpoint_url(&Url::parse(origin).expect("origin"), "/ws/notifications/")
    }

    #[test]
    fn test_http_origin_uses_ws() {
        let url = derive("http://crm.local/print-orders/?page=2").expect("endpoint");
        assert_eq!(url.as_str(), "ws://crm.local/ws/notifications/");
    }

    #[test]
    fn test_https_origin_uses_wss() {
        let url = derive("https://crm.example.com/index/").expect("endpoint");
        assert_eq!(url.as_str(), "wss://crm.example.com/ws/notifications/");
    }

    #[test]
    fn test_port_is_kept() {
        let url = derive("http://127.0.0.1:8000/index/").expect("endpoint");
        assert_eq!(url.as_str(), "ws://127.0.0.1:8000/ws/notifications/");
    }

    #[test]
    fn test_ipv6_host() {
        let url = derive("http://[::1]:8000/").expect("endpoint");
        assert_eq!(url.as_str(), "ws://[::1]:8000/ws/notifications/");
    }

    #[test]
    fn test_origin_without_host() {
        let err = derive("file:///tmp/page.html").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
