//! WebSocket link over tokio-tungstenite.
//!
//! # Event Loop
//!
//! Each [`Connection`] spawns a tokio task that:
//!
//! - Performs the client handshake (abortable by `close`, bounded by the
//!   connector's handshake timeout)
//! - Forwards inbound text frames as [`TransportSignal::Message`]
//! - Writes queued outbound frames
//! - Emits exactly one [`TransportSignal::Closed`] when it ends

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::Generation;

use super::{Connector, EventSender, TransportEvent, TransportHandle, TransportSignal};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Constants
// ============================================================================

/// Default upper bound on the WebSocket handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a text frame.
    Send(String),
    /// Close the link.
    Shutdown,
}

// ============================================================================
// WsConnector
// ============================================================================

/// [`Connector`] producing tokio-tungstenite links.
#[derive(Debug, Clone, Copy)]
pub struct WsConnector {
    /// How long a peer may take to answer the upgrade.
    handshake_timeout: Duration,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl WsConnector {
    /// Creates a connector with [`DEFAULT_HANDSHAKE_TIMEOUT`].
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the handshake timeout.
    ///
    /// A link whose handshake exceeds it reports
    /// [`Error::ConnectionTimeout`] and then closes.
    #[inline]
    #[must_use]
    pub const fn with_handshake_timeout(mut self, handshake_timeout: Duration) -> Self {
        self.handshake_timeout = handshake_timeout;
        self
    }

    /// Returns the handshake timeout.
    #[inline]
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }
}

impl Connector for WsConnector {
    fn open(
        &self,
        url: &Url,
        generation: Generation,
        events: EventSender,
    ) -> Result<Box<dyn TransportHandle>> {
        check_scheme(url)?;
        Ok(Box::new(Connection::spawn(
            url.clone(),
            generation,
            events,
            self.handshake_timeout,
        )?))
    }
}

/// Rejects endpoints this build cannot dial.
fn check_scheme(url: &Url) -> Result<()> {
    match url.scheme() {
        "ws" => Ok(()),
        "wss" if cfg!(feature = "native-tls") => Ok(()),
        "wss" => Err(Error::transport_construction(
            "wss endpoint requires the `native-tls` feature",
        )),
        other => Err(Error::transport_construction(format!(
            "unsupported scheme: {other}"
        ))),
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to one WebSocket link.
///
/// Dropping the handle closes the link.
#[derive(Debug)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Link identity, for logging.
    generation: Generation,
}

impl Connection {
    /// Spawns the event loop for a link to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportConstruction`] if called outside a tokio
    /// runtime.
    pub fn spawn(
        url: Url,
        generation: Generation,
        events: EventSender,
        handshake_timeout: Duration,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::transport_construction(e.to_string()))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        runtime.spawn(Self::run_event_loop(
            url,
            generation,
            events,
            command_rx,
            handshake_timeout,
        ));

        Ok(Self {
            command_tx,
            generation,
        })
    }

    /// Returns the link identity.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Event loop: handshake, then pump frames until either side closes.
    async fn run_event_loop(
        url: Url,
        generation: Generation,
        events: EventSender,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        handshake_timeout: Duration,
    ) {
        let emit = |signal| {
            // Receiver gone means the manager has shut down.
            let _ = events.send(TransportEvent::new(generation, signal));
        };

        let ws_stream = tokio::select! {
            result = timeout(handshake_timeout, connect_async(url.as_str())) => match result {
                Ok(Ok((stream, _response))) => stream,
                Ok(Err(e)) => {
                    debug!(%generation, error = %e, "WebSocket handshake failed");
                    emit(TransportSignal::Error(Error::from(e)));
                    emit(TransportSignal::Closed { reason: None });
                    return;
                }
                Err(_) => {
                    let error = Error::ConnectionTimeout {
                        timeout_ms: handshake_timeout.as_millis() as u64,
                    };
                    debug!(%generation, %error, "WebSocket handshake timed out");
                    emit(TransportSignal::Error(error));
                    emit(TransportSignal::Closed { reason: None });
                    return;
                }
            },
            _ = Self::wait_shutdown(&mut command_rx) => {
                debug!(%generation, "Handshake aborted");
                emit(TransportSignal::Closed { reason: None });
                return;
            }
        };

        debug!(%generation, %url, "WebSocket connected");
        emit(TransportSignal::Open);

        let reason = Self::pump(ws_stream, &mut command_rx, &emit, generation).await;
        emit(TransportSignal::Closed { reason });

        debug!(%generation, "Event loop terminated");
    }

    /// Pumps frames in both directions. Returns the peer's close reason.
    async fn pump(
        ws_stream: WsStream,
        command_rx: &mut mpsc::UnboundedReceiver<ConnectionCommand>,
        emit: &impl Fn(TransportSignal),
        generation: Generation,
    ) -> Option<String> {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(%generation, len = text.len(), "Frame received");
                            emit(TransportSignal::Message(text.as_str().to_owned()));
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(%generation, "WebSocket closed by remote");
                            return frame.map(|f| f.reason.as_str().to_owned());
                        }

                        Some(Err(e)) => {
                            warn!(%generation, error = %e, "WebSocket error");
                            emit(TransportSignal::Error(Error::from(e)));
                            return None;
                        }

                        None => {
                            debug!(%generation, "WebSocket stream ended");
                            return None;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the manager
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(text)) => {
                            if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                warn!(%generation, error = %e, "Failed to write frame");
                                emit(TransportSignal::Error(Error::from(e)));
                                return None;
                            }
                        }

                        Some(ConnectionCommand::Shutdown) | None => {
                            debug!(%generation, "Shutdown command received");
                            let _ = ws_write.close().await;
                            return None;
                        }
                    }
                }
            }
        }
    }

    /// Resolves once a shutdown is requested. Frames queued before the
    /// handshake completes are discarded.
    async fn wait_shutdown(command_rx: &mut mpsc::UnboundedReceiver<ConnectionCommand>) {
        loop {
            match command_rx.recv().await {
                Some(ConnectionCommand::Shutdown) | None => return,
                Some(ConnectionCommand::Send(_)) => {
                    warn!("Dropping frame queued before handshake");
                }
            }
        }
    }
}

impl TransportHandle for Connection {
    fn send_text(&self, text: String) -> Result<()> {
        self.command_tx
            .send(ConnectionCommand::Send(text))
            .map_err(|_| Error::ConnectionClosed)
    }

    fn close(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    async fn next_signal(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> TransportSignal {
        timeout(WAIT, rx.recv())
            .await
            .expect("signal in time")
            .expect("channel open")
            .signal
    }

    #[test]
    fn test_check_scheme() {
        let ws = Url::parse("ws://example.com/ws/notifications/").expect("url");
        assert!(check_scheme(&ws).is_ok());

        let http = Url::parse("http://example.com/").expect("url");
        let err = check_scheme(&http).unwrap_err();
        assert!(matches!(err, Error::TransportConstruction { .. }));
    }

    #[cfg(not(feature = "native-tls"))]
    #[test]
    fn test_wss_requires_tls_feature() {
        let wss = Url::parse("wss://example.com/ws/notifications/").expect("url");
        assert!(check_scheme(&wss).is_err());
    }

    #[tokio::test]
    async fn test_refused_connection_reports_error_then_closed() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{port}/")).expect("url");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _link = WsConnector::new()
            .open(&url, Generation::new(3), tx)
            .expect("link starts");

        assert!(matches!(
            next_signal(&mut rx).await,
            TransportSignal::Error(Error::WebSocket(_))
        ));
        assert!(matches!(
            next_signal(&mut rx).await,
            TransportSignal::Closed { reason: None }
        ));
    }

    #[tokio::test]
    async fn test_silent_peer_times_out_then_closed() {
        // Accepts TCP but never answers the upgrade.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let url = Url::parse(&format!("ws://127.0.0.1:{port}/")).expect("url");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connector = WsConnector::new().with_handshake_timeout(Duration::from_millis(200));
        assert_eq!(connector.handshake_timeout(), Duration::from_millis(200));
        let _link = connector
            .open(&url, Generation::new(4), tx)
            .expect("link starts");

        assert!(matches!(
            next_signal(&mut rx).await,
            TransportSignal::Error(Error::ConnectionTimeout { timeout_ms: 200 })
        ));
        assert!(matches!(
            next_signal(&mut rx).await,
            TransportSignal::Closed { reason: None }
        ));
    }

    #[tokio::test]
    async fn test_echo_round_trip_and_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("upgrade");
            while let Some(Ok(message)) = ws.next().await {
                if message.is_text() && ws.send(message).await.is_err() {
                    break;
                }
            }
        });

        let url = Url::parse(&format!("ws://127.0.0.1:{port}/")).expect("url");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let link = Connection::spawn(url, Generation::new(1), tx, DEFAULT_HANDSHAKE_TIMEOUT)
            .expect("link starts");
        assert_eq!(link.generation(), Generation::new(1));

        assert!(matches!(next_signal(&mut rx).await, TransportSignal::Open));

        link.send_text(r#"{"type":"ping"}"#.to_string()).expect("queued");
        assert!(matches!(
            next_signal(&mut rx).await,
            TransportSignal::Message(text) if text == r#"{"type":"ping"}"#
        ));

        link.close();
        assert!(matches!(next_signal(&mut rx).await, TransportSignal::Closed { .. }));
    }
}
