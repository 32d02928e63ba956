//! Live channel state machine.
//!
//! ```text
//! Closed ──start──▶ Opening ──Opened──▶ Open ──close frame──▶ Closing
//!   ▲                  │                  │                      │
//!   └──────────────────┴──── Closed{code} ┴──────────────────────┘
//! ```
//!
//! Every transition is a plain method call on [`ChannelMachine`] returning
//! the side effects to perform. The machine owns the channel state and the
//! retry counter and nothing else, so the reconnect/fallback policy can be
//! exercised without a socket.

use jeedom_sdk::objects::WsCloseCode;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Signals coming from the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The transport is connected.
    Opened,
    /// A text frame arrived.
    Message,
    /// Transport-level failure. Closure follows as a separate event.
    TransportError,
    /// The peer started the closing handshake.
    CloseReceived,
    /// The connection is gone.
    Closed { code: u16 },
}

/// What the world looked like when `start` was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartConditions {
    pub online: bool,
    pub has_endpoint: bool,
    pub has_credential: bool,
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// One one-shot poll, leaving the channel alone.
    RefreshOnce,
    /// Switch delivery to continuous polling.
    StartPolling,
    ReportAuthFailure,
    OpenSocket,
    /// Send the credential as the first frame.
    SendHandshake,
    /// Decode and apply the message that just arrived.
    Deliver,
    ReportListening(bool),
    /// `start(false, false)` again.
    Reconnect,
}

#[derive(Debug, Clone)]
pub struct ChannelMachine {
    state: ChannelState,
    retries: u32,
    max_tries: u32,
    /// Whether the current connection attempt already counted a failure.
    failed_since_start: bool,
}

impl ChannelMachine {
    pub fn new(max_tries: u32) -> Self {
        Self {
            state: ChannelState::Closed,
            retries: 0,
            max_tries,
            failed_since_start: false,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ChannelState::Opening | ChannelState::Open)
    }

    /// Request to start listening.
    ///
    /// `reset_counter` is for deliberate fresh sessions; automatic retries
    /// pass `false`. `force_refresh` polls once before opening so nothing
    /// is missed between the last known state and the first pushed event.
    pub fn start(
        &mut self,
        reset_counter: bool,
        force_refresh: bool,
        conditions: StartConditions,
    ) -> Vec<Effect> {
        if !conditions.online {
            debug!("Offline, not starting events listener");
            return Vec::new();
        }
        if !conditions.has_endpoint {
            return vec![Effect::StartPolling];
        }
        if !conditions.has_credential {
            return vec![Effect::ReportAuthFailure];
        }
        if self.is_active() {
            warn!(state = ?self.state, "Socket already opened");
            return Vec::new();
        }

        let mut effects = Vec::with_capacity(2);
        if force_refresh {
            effects.push(Effect::RefreshOnce);
        }
        if reset_counter {
            self.retries = 0;
        }
        self.state = ChannelState::Opening;
        self.failed_since_start = false;
        effects.push(Effect::OpenSocket);
        effects
    }

    /// Feed a socket event. `online` is the gate reading at that moment.
    pub fn handle(&mut self, event: ChannelEvent, online: bool) -> Vec<Effect> {
        match event {
            ChannelEvent::Opened => {
                if self.state != ChannelState::Opening {
                    return Vec::new();
                }
                self.state = ChannelState::Open;
                info!("Events socket connection opened");
                vec![Effect::SendHandshake, Effect::ReportListening(true)]
            }
            ChannelEvent::Message => {
                if self.state == ChannelState::Open {
                    vec![Effect::Deliver]
                } else {
                    Vec::new()
                }
            }
            ChannelEvent::TransportError => {
                if self.is_active() {
                    self.record_failure();
                }
                Vec::new()
            }
            ChannelEvent::CloseReceived => {
                if self.is_active() {
                    self.state = ChannelState::Closing;
                }
                Vec::new()
            }
            ChannelEvent::Closed { code } => self.closed(code, online),
        }
    }

    /// Local teardown, a clean close. Returns whether a socket was live and
    /// must be closed.
    ///
    /// The socket task is detached from here on and its own close event is
    /// never fed back, so the machine goes straight to `Closed`.
    pub fn close(&mut self) -> bool {
        let was_live = self.state != ChannelState::Closed;
        self.state = ChannelState::Closed;
        self.retries = 0;
        was_live
    }

    fn record_failure(&mut self) {
        self.failed_since_start = true;
        self.retries = (self.retries + 1).min(self.max_tries);
    }

    fn closed(&mut self, code: u16, online: bool) -> Vec<Effect> {
        if self.state == ChannelState::Closed {
            return Vec::new();
        }
        self.state = ChannelState::Closed;
        let mut effects = vec![Effect::ReportListening(false)];
        let (retries, max) = (self.retries, self.max_tries);

        match code {
            WsCloseCode::NORMAL | WsCloseCode::GOING_AWAY => {
                info!(code, "Events socket connection closed");
                self.retries = 0;
            }
            WsCloseCode::ABNORMAL => {
                if !self.failed_since_start {
                    self.record_failure();
                }
                let retries = self.retries;
                if !online {
                    warn!(code, retries, max, "Network failure, events socket connection closed");
                } else if retries >= max {
                    warn!(code, retries, max, "Events socket connection closed, falling back to polling");
                    effects.push(Effect::StartPolling);
                } else {
                    warn!(code, retries, max, "Events socket connection closed, reconnecting...");
                    effects.push(Effect::Reconnect);
                }
            }
            _ => {
                warn!(code, retries, max, "Events socket connection closed");
            }
        }
        effects
    }
}
