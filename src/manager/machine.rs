//! Connection lifecycle state machine.
//!
//! Pure: [`LifecycleMachine::handle`] takes one [`Input`] and returns the
//! [`Effect`]s the runtime must perform. No I/O and no timers live here, so
//! every transition can be tested without a transport.
//!
//! # States
//!
//! ```text
//! Init ──start──► Connecting ──open──► Open
//!                   ▲    │               │
//!                   │  close           close
//!                   │    ▼               ▼
//!                   └─ reconnect scheduled (attempts < max, attempts+1)
//!                        or Failed     (attempts == max)
//!
//! shutdown from any state ──► Closed
//! ```
//!
//! `Failed` and `Closed` are terminal.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use crate::identifiers::Generation;
use crate::protocol::heartbeat_frame;

use super::options::ReconnectPolicy;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Constructed, first connect not yet issued.
    #[default]
    Init,
    /// A link is being established or a reconnect is pending.
    Connecting,
    /// A link is open.
    Open,
    /// Reconnect attempts exhausted. Terminal.
    Failed,
    /// Shut down. Terminal.
    Closed,
}

impl ConnectionState {
    /// Returns `true` for `Failed` and `Closed`.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }

    /// Returns the state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Input / Effect
// ============================================================================

/// Discrete event fed to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Issue the first connect.
    Start,
    /// The reconnect delay elapsed.
    ReconnectDue,
    /// The heartbeat period elapsed.
    HeartbeatDue,
    /// The connector refused to start a link.
    ConstructionFailed(Generation),
    /// A link completed its handshake.
    Opened(Generation),
    /// A link delivered a text frame.
    Frame(Generation, String),
    /// A link reported an error.
    Errored(Generation),
    /// A link closed.
    Closed(Generation),
    /// Caller wants to send a serialized message.
    Send(String),
    /// Tear everything down.
    Shutdown,
}

/// Side effect requested by the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start a new link with this generation.
    Connect(Generation),
    /// Decode and dispatch an inbound frame.
    Route(String),
    /// Write a frame on the live link.
    Write(String),
    /// Drop an outbound message because nothing is connected.
    RejectSend(String),
    /// Update the connection indicator.
    Indicate(bool),
    /// Arm the reconnect timer.
    ScheduleReconnect {
        /// Delay before reconnecting.
        delay: Duration,
        /// Attempt number being scheduled (1-based).
        attempt: u32,
    },
    /// Disarm the reconnect timer.
    CancelReconnect,
    /// Close and discard the live link handle.
    ReleaseTransport,
    /// Tell the user automatic recovery has stopped.
    NotifyFailure,
}

// ============================================================================
// LifecycleMachine
// ============================================================================

/// Connection lifecycle state plus reconnect accounting.
#[derive(Debug, Clone)]
pub struct LifecycleMachine {
    policy: ReconnectPolicy,
    state: ConnectionState,
    generation: Generation,
    /// Whether `generation` still owns a link whose callbacks count.
    link_live: bool,
    connected: bool,
    reconnect_attempts: u32,
}

impl LifecycleMachine {
    /// Creates a machine in `Init`.
    #[must_use]
    pub const fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Init,
            generation: Generation::new(0),
            link_live: false,
            connected: false,
            reconnect_attempts: 0,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a link is open.
    #[inline]
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Consecutive failed attempts since the last successful open.
    #[inline]
    #[must_use]
    pub const fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Generation of the most recent link.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Policy in force.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// Applies one input.
    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::Start => match self.state {
                ConnectionState::Init => self.connect(),
                _ => Vec::new(),
            },

            Input::ReconnectDue => {
                if self.state == ConnectionState::Connecting && !self.link_live {
                    self.connect()
                } else {
                    Vec::new()
                }
            }

            Input::HeartbeatDue => {
                if self.connected {
                    vec![Effect::Write(heartbeat_frame())]
                } else {
                    Vec::new()
                }
            }

            Input::Opened(generation) => {
                if !self.is_current(generation) || self.state != ConnectionState::Connecting {
                    return Vec::new();
                }
                self.state = ConnectionState::Open;
                self.connected = true;
                self.reconnect_attempts = 0;
                vec![Effect::Indicate(true)]
            }

            Input::Frame(generation, text) => {
                if self.is_current(generation) && self.state == ConnectionState::Open {
                    vec![Effect::Route(text)]
                } else {
                    Vec::new()
                }
            }

            // An error is always followed by a close, which does the
            // reconnect accounting.
            Input::Errored(generation) => {
                if !self.is_current(generation) {
                    return Vec::new();
                }
                self.connected = false;
                vec![Effect::Indicate(false)]
            }

            Input::Closed(generation) | Input::ConstructionFailed(generation) => {
                if !self.is_current(generation) {
                    return Vec::new();
                }
                self.link_live = false;
                self.connected = false;

                let mut effects = vec![Effect::ReleaseTransport, Effect::Indicate(false)];
                effects.extend(self.reconnect());
                effects
            }

            Input::Send(text) => {
                if self.connected {
                    vec![Effect::Write(text)]
                } else {
                    vec![Effect::RejectSend(text)]
                }
            }

            Input::Shutdown => {
                if self.state == ConnectionState::Closed {
                    return Vec::new();
                }
                self.state = ConnectionState::Closed;
                self.link_live = false;
                self.connected = false;
                vec![Effect::CancelReconnect, Effect::ReleaseTransport]
            }
        }
    }

    /// Callbacks count only for the newest link, while it is live.
    fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation && self.link_live && !self.state.is_terminal()
    }

    fn connect(&mut self) -> Vec<Effect> {
        self.generation = self.generation.next();
        self.link_live = true;
        self.state = ConnectionState::Connecting;
        vec![Effect::Connect(self.generation)]
    }

    /// Every close below the cap schedules one more attempt; the close
    /// that finds the cap already reached enters `Failed`.
    fn reconnect(&mut self) -> Vec<Effect> {
        if self.reconnect_attempts >= self.policy.max_attempts {
            self.state = ConnectionState::Failed;
            return vec![Effect::NotifyFailure];
        }

        self.reconnect_attempts += 1;
        self.state = ConnectionState::Connecting;
        vec![Effect::ScheduleReconnect {
            delay: self.policy.interval,
            attempt: self.reconnect_attempts,
        }]
    }
}

// ============================================================================
// Tests
// ============================================================================
