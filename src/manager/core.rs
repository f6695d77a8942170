//! Connection manager handle and lifecycle task.
//!
//! All lifecycle work runs on one tokio task. Transport signals, timer
//! expiries and API commands are multiplexed with `tokio::select!` and fed
//! to the [`LifecycleMachine`] one at a time, so frames are routed in
//! delivery order and no state is touched concurrently.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep, interval_at, sleep};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::Error;
use crate::identifiers::Generation;
use crate::protocol::Envelope;
use crate::render::{Render, Severity};
use crate::router::MessageRouter;
use crate::transport::{
    Connector, EventSender, TransportEvent, TransportHandle, TransportSignal,
};

use super::builder::ConnectionManagerBuilder;
use super::machine::{ConnectionState, Effect, Input, LifecycleMachine};
use super::options::ClientOptions;

// ============================================================================
// Constants
// ============================================================================

/// Persistent notification shown once reconnection is abandoned.
pub const FAILURE_MESSAGE: &str = "Connection lost. Please reload the page.";

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time view of the lifecycle, readable from any thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Lifecycle state.
    pub state: ConnectionState,
    /// Whether a link is open.
    pub connected: bool,
    /// Consecutive failed attempts.
    pub reconnect_attempts: u32,
    /// Generation of the most recent link.
    pub generation: Generation,
}

impl Snapshot {
    fn of(machine: &LifecycleMachine) -> Self {
        Self {
            state: machine.state(),
            connected: machine.is_connected(),
            reconnect_attempts: machine.reconnect_attempts(),
            generation: machine.generation(),
        }
    }
}

// ============================================================================
// ManagerCommand
// ============================================================================

/// Commands from the handle to the lifecycle task.
enum ManagerCommand {
    /// Send a serialized message.
    Send(String),
    /// Shut down.
    Shutdown,
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Handle to a running notification channel.
///
/// Cloning yields another handle to the same channel. The channel shuts
/// down when [`shutdown`](Self::shutdown) is called or when the last handle
/// is dropped.
///
/// # Example
///
/// ```no_run
/// use live_notify::ConnectionManager;
///
/// # async fn example() -> live_notify::Result<()> {
/// let manager = ConnectionManager::builder()
///     .origin("https://crm.example.com/index/")
///     .start()?;
///
/// manager.send(&serde_json::json!({ "type": "subscribe", "room": "orders" }));
///
/// // Page teardown
/// manager.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionManager {
    /// Channel for sending commands to the lifecycle task.
    command_tx: mpsc::UnboundedSender<ManagerCommand>,
    /// Latest lifecycle snapshot (written by the task).
    snapshot: Arc<RwLock<Snapshot>>,
    /// Endpoint every link dials.
    endpoint: Arc<Url>,
}

impl ConnectionManager {
    /// Creates a new builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ConnectionManagerBuilder {
        ConnectionManagerBuilder::new()
    }

    /// Spawns the lifecycle task and issues the first connect.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        endpoint: Url,
        options: &ClientOptions,
        connector: Arc<dyn Connector>,
        router: MessageRouter,
        render: Arc<dyn Render>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let machine = LifecycleMachine::new(options.policy);
        let snapshot = Arc::new(RwLock::new(Snapshot::of(&machine)));

        let mut heartbeat = interval_at(
            Instant::now() + options.heartbeat_interval,
            options.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let task = LifecycleTask {
            machine,
            endpoint: endpoint.clone(),
            connector,
            router,
            render,
            transport: None,
            events_tx,
            events_rx,
            command_rx,
            reconnect_timer: None,
            heartbeat,
            snapshot: Arc::clone(&snapshot),
        };

        info!(%endpoint, "Starting notification channel");
        tokio::spawn(task.run());

        Self {
            command_tx,
            snapshot,
            endpoint: Arc::new(endpoint),
        }
    }

    /// Sends `message` as JSON if a link is open.
    ///
    /// While disconnected the message is dropped and an error is logged;
    /// callers must not assume delivery.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) {
        match serde_json::to_string(message) {
            Ok(json) => self.dispatch(ManagerCommand::Send(json)),
            Err(e) => error!(error = %Error::Json(e), "Failed to serialize outbound message"),
        }
    }

    /// Closes the link and stops all timers. Idempotent.
    pub fn shutdown(&self) {
        self.dispatch(ManagerCommand::Shutdown);
    }

    /// Latest lifecycle snapshot.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        *self.snapshot.read()
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.snapshot.read().state
    }

    /// Whether a link is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.snapshot.read().connected
    }

    /// Consecutive failed attempts since the last successful open.
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.snapshot.read().reconnect_attempts
    }

    /// Endpoint every link dials.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn dispatch(&self, command: ManagerCommand) {
        if self.command_tx.send(command).is_err() {
            debug!("Notification channel already stopped");
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.endpoint.as_str())
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

// ============================================================================
// LifecycleTask
// ============================================================================

/// State owned by the lifecycle task.
struct LifecycleTask {
    machine: LifecycleMachine,
    endpoint: Url,
    connector: Arc<dyn Connector>,
    router: MessageRouter,
    render: Arc<dyn Render>,
    /// The single live link, if any.
    transport: Option<Box<dyn TransportHandle>>,
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<TransportEvent>,
    command_rx: mpsc::UnboundedReceiver<ManagerCommand>,
    reconnect_timer: Option<Pin<Box<Sleep>>>,
    heartbeat: Interval,
    snapshot: Arc<RwLock<Snapshot>>,
}

impl LifecycleTask {
    async fn run(mut self) {
        self.apply(Input::Start);

        loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => {
                    self.apply(Self::input_for(event));
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(ManagerCommand::Send(json)) => self.apply(Input::Send(json)),
                        Some(ManagerCommand::Shutdown) => self.apply(Input::Shutdown),
                        None => {
                            debug!("All handles dropped");
                            self.apply(Input::Shutdown);
                        }
                    }
                }

                () = Self::reconnect_due(&mut self.reconnect_timer) => {
                    self.reconnect_timer = None;
                    self.apply(Input::ReconnectDue);
                }

                _ = self.heartbeat.tick() => {
                    self.apply(Input::HeartbeatDue);
                }
            }

            if self.machine.state() == ConnectionState::Closed {
                break;
            }
        }

        info!("Notification channel stopped");
    }

    /// Resolves when the armed reconnect timer fires; never if disarmed.
    async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
        match timer {
            Some(delay) => delay.as_mut().await,
            None => pending().await,
        }
    }

    fn input_for(event: TransportEvent) -> Input {
        let TransportEvent { generation, signal } = event;
        match signal {
            TransportSignal::Open => Input::Opened(generation),
            TransportSignal::Message(text) => Input::Frame(generation, text),
            TransportSignal::Error(error) => {
                if error.is_connection_error() {
                    debug!(%generation, %error, "Transport error");
                } else {
                    warn!(%generation, %error, "Unexpected transport error");
                }
                Input::Errored(generation)
            }
            TransportSignal::Closed { reason } => {
                debug!(%generation, ?reason, "Transport closed");
                Input::Closed(generation)
            }
        }
    }

    /// Feeds `input` to the machine and performs the resulting effects.
    fn apply(&mut self, input: Input) {
        let mut inputs = VecDeque::from([input]);

        while let Some(input) = inputs.pop_front() {
            for effect in self.machine.handle(input) {
                if let Some(follow_up) = self.perform(effect) {
                    inputs.push_back(follow_up);
                }
            }
        }

        *self.snapshot.write() = Snapshot::of(&self.machine);
    }

    /// Performs one effect. May yield a follow-up input.
    fn perform(&mut self, effect: Effect) -> Option<Input> {
        match effect {
            Effect::Connect(generation) => {
                debug!(%generation, endpoint = %self.endpoint, "Connecting");
                match self
                    .connector
                    .open(&self.endpoint, generation, self.events_tx.clone())
                {
                    Ok(handle) => {
                        self.transport = Some(handle);
                        None
                    }
                    Err(e) => {
                        warn!(%generation, error = %e, "Failed to start transport");
                        Some(Input::ConstructionFailed(generation))
                    }
                }
            }

            Effect::Route(text) => {
                match Envelope::decode(&text) {
                    Ok(envelope) => {
                        self.router.dispatch(&envelope);
                    }
                    Err(e) => warn!(error = %e, "Dropping malformed frame"),
                }
                None
            }

            Effect::Write(json) => {
                match &self.transport {
                    Some(transport) => {
                        if let Err(e) = transport.send_text(json) {
                            warn!(error = %e, "Failed to queue frame");
                        } else {
                            trace!("Frame queued");
                        }
                    }
                    None => warn!("No transport for outbound frame"),
                }
                None
            }

            Effect::RejectSend(json) => {
                error!(error = %Error::SendWhileDisconnected, len = json.len(), "Message dropped");
                None
            }

            Effect::Indicate(connected) => {
                if connected {
                    info!(generation = %self.machine.generation(), "Connection established");
                }
                self.render.update_connection_indicator(connected);
                None
            }

            Effect::ScheduleReconnect { delay, attempt } => {
                info!(
                    attempt,
                    max = self.machine.policy().max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnect"
                );
                self.reconnect_timer = Some(Box::pin(sleep(delay)));
                None
            }

            Effect::CancelReconnect => {
                if self.reconnect_timer.take().is_some() {
                    debug!("Pending reconnect cancelled");
                }
                None
            }

            Effect::ReleaseTransport => {
                if let Some(transport) = self.transport.take() {
                    transport.close();
                }
                None
            }

            Effect::NotifyFailure => {
                error!(
                    attempts = self.machine.reconnect_attempts(),
                    "Reconnect attempts exhausted"
                );
                self.render.show_notification(FAILURE_MESSAGE, Severity::Error);
                None
            }
        }
    }
}
