//! The event listener session.
//!
//! [`EventListener`] owns everything the event machinery mutates: the
//! credential source, the cursor, the retry counter, the socket and the
//! polling timer. It delivers events through exactly one path at a time,
//! tracked by [`DeliveryMode`]:
//!
//! - `Streaming`: a single WebSocket task ([`channel`]) pushes batches.
//! - `Polling`: a single timer task ([`polling`]) calls `event::changes`
//!   every `read_delay`.
//! - `Idle`: nothing is running.
//!
//! A forced refresh may run one extra poll next to the socket.
//!
//! All shared state sits behind one mutex that is only held for
//! synchronous sections, never across an `.await`.

pub mod channel;
pub mod machine;
pub mod polling;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jeedom_sdk::client::RpcError;
use kanau::processor::Processor;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ListenerConfig;
use crate::connectivity::ConnectivityGate;
use crate::events::{BatchApplier, Cursor, DecodedBatch};
use crate::sink::EventSink;
use crate::transport::RpcTransport;
use machine::{ChannelEvent, ChannelMachine, ChannelState, Effect, StartConditions};

/// Which path currently owns event delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Idle,
    Streaming,
    Polling,
}

/// Errors returned by [`EventListener::poll_once`].
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The RPC call failed. Stops a continuous polling chain.
    #[error("event poll failed: {0}")]
    Poll(#[from] RpcError),
}

struct ChannelHandle {
    generation: u64,
    shutdown: watch::Sender<bool>,
    _task: JoinHandle<()>,
}

struct PollTimer {
    generation: u64,
    task: JoinHandle<()>,
}

struct SessionState {
    machine: ChannelMachine,
    cursor: Cursor,
    mode: DeliveryMode,
    channel: Option<ChannelHandle>,
    poll_timer: Option<PollTimer>,
    /// One-shot poll requested by a forced refresh.
    refresh: Option<JoinHandle<()>>,
    /// Bumped for every socket or timer spawned, and on close. Tasks carry
    /// the value they were spawned with; stale tasks are ignored.
    generation: u64,
}

struct Inner {
    config: ListenerConfig,
    transport: Arc<dyn RpcTransport>,
    gate: Arc<dyn ConnectivityGate>,
    sink: Arc<dyn EventSink>,
    applier: BatchApplier,
    state: Mutex<SessionState>,
}

/// Reconnecting, failover-capable event listener.
///
/// Cheap to clone; clones drive the same session. Must be used from within
/// a Tokio runtime since starting spawns tasks.
#[derive(Clone)]
pub struct EventListener {
    inner: Arc<Inner>,
}

impl EventListener {
    pub fn new(
        config: ListenerConfig,
        transport: Arc<dyn RpcTransport>,
        gate: Arc<dyn ConnectivityGate>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let machine = ChannelMachine::new(config.max_tries);
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                gate,
                applier: BatchApplier::new(sink.clone()),
                sink,
                state: Mutex::new(SessionState {
                    machine,
                    cursor: Cursor::now(),
                    mode: DeliveryMode::Idle,
                    channel: None,
                    poll_timer: None,
                    refresh: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Start at a given cursor instead of "now".
    pub fn with_cursor(self, cursor: Cursor) -> Self {
        self.lock().cursor = cursor;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.inner.config
    }

    pub fn cursor(&self) -> Cursor {
        self.lock().cursor
    }

    pub fn mode(&self) -> DeliveryMode {
        self.lock().mode
    }

    pub fn channel_state(&self) -> ChannelState {
        self.lock().machine.state()
    }

    pub fn retries(&self) -> u32 {
        self.lock().machine.retries()
    }

    /// Start listening for events.
    ///
    /// Does nothing while offline. Without a push endpoint, polls
    /// continuously. Otherwise opens the socket unless one is already open
    /// or opening. `reset_counter` clears the retry counter (fresh session);
    /// `force_refresh` polls once first to close the gap before the first
    /// pushed event.
    pub fn start(&self, reset_counter: bool, force_refresh: bool) {
        let conditions = StartConditions {
            online: self.inner.gate.is_online(),
            has_endpoint: self.inner.config.websocket_url.is_some(),
            has_credential: self.inner.transport.api_key().is_some(),
        };
        let effects = self
            .lock()
            .machine
            .start(reset_counter, force_refresh, conditions);
        self.run_effects(effects, None);
    }

    /// Tear everything down: close the socket, cancel the polling timer and
    /// report "not listening". Safe to call in any state, any number of
    /// times.
    pub fn close(&self) {
        let (channel, timer, refresh) = {
            let mut state = self.lock();
            state.machine.close();
            state.generation += 1;
            state.mode = DeliveryMode::Idle;
            (
                state.channel.take(),
                state.poll_timer.take(),
                state.refresh.take(),
            )
        };
        if let Some(channel) = channel {
            debug!(generation = channel.generation, "Closing events socket");
            let _ = channel.shutdown.send(true);
        }
        if let Some(timer) = timer {
            debug!(generation = timer.generation, "Cancelling polling timer");
            timer.task.abort();
        }
        if let Some(refresh) = refresh {
            refresh.abort();
        }
        self.inner.sink.report_listener_status(false);
    }

    /// Fetch the events raised since the cursor, apply them and move the
    /// cursor. Returns the number of deltas applied. Malformed events are
    /// skipped; the cursor still moves to the batch timestamp.
    ///
    /// On RPC failure the sink is told that the listener stopped and that
    /// communication failed; the cursor is left untouched.
    pub async fn poll_once(&self) -> Result<usize, ListenerError> {
        self.inner.sink.report_listener_status(true);
        let since = self.cursor();

        let batch = match self.inner.transport.fetch_events(since).await {
            Ok(batch) => batch,
            Err(e) => {
                self.inner.sink.report_listener_status(false);
                self.inner.sink.report_communication_error();
                tracing::error!(error = %e, %since, "Failed to poll events");
                return Err(e.into());
            }
        };

        Ok(self.apply(crate::events::decode(batch)).await)
    }

    /// Move the cursor and hand the deltas to the sink.
    async fn apply(&self, batch: DecodedBatch) -> usize {
        {
            let mut state = self.lock();
            if batch.cursor < state.cursor {
                debug!(from = %state.cursor, to = %batch.cursor, "Server moved the cursor backwards");
            }
            state.cursor = batch.cursor;
        }
        match self.inner.applier.process(batch).await {
            Ok(applied) => applied,
            Err(never) => match never {},
        }
    }

    /// Feed a socket event from the task spawned with `generation`.
    ///
    /// Returns the effects the socket task has to carry out itself.
    pub(crate) fn dispatch(&self, generation: u64, event: ChannelEvent) -> Vec<Effect> {
        let online = self.inner.gate.is_online();
        let effects = {
            let mut state = self.lock();
            let current = state.channel.as_ref().map(|c| c.generation);
            if current != Some(generation) {
                debug!(generation, ?event, "Ignoring event from a stale socket");
                return Vec::new();
            }
            let effects = state.machine.handle(event, online);
            if let ChannelEvent::Closed { .. } = event {
                state.channel = None;
                if state.mode == DeliveryMode::Streaming {
                    state.mode = DeliveryMode::Idle;
                }
            }
            effects
        };
        let mut socket_effects = Vec::new();
        self.run_effects(effects, Some(&mut socket_effects));
        socket_effects
    }

    /// Decode and apply a pushed text frame. A bad frame is logged and
    /// dropped; the socket stays open.
    pub(crate) async fn deliver(&self, text: &str) {
        match crate::events::decode_text(text) {
            Ok(decoded) => {
                self.apply(decoded).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error during events parsing");
            }
        }
    }

    fn run_effects(&self, effects: Vec<Effect>, mut socket: Option<&mut Vec<Effect>>) {
        for effect in effects {
            match effect {
                Effect::RefreshOnce => self.spawn_refresh(),
                Effect::StartPolling => self.start_polling(),
                Effect::ReportAuthFailure => self.inner.sink.report_auth_failure(),
                Effect::OpenSocket => self.open_socket(),
                Effect::ReportListening(listening) => {
                    self.inner.sink.report_listener_status(listening)
                }
                Effect::Reconnect => self.start(false, false),
                Effect::SendHandshake | Effect::Deliver => match socket.as_deref_mut() {
                    Some(socket) => socket.push(effect),
                    None => warn!(?effect, "Socket effect outside of a socket task"),
                },
            }
        }
    }

    fn open_socket(&self) {
        let Some(url) = self.inner.config.websocket_url.clone() else {
            return;
        };
        let mut state = self.lock();
        if let Some(timer) = state.poll_timer.take() {
            debug!(generation = timer.generation, "Socket takes over from polling");
            timer.task.abort();
        }
        state.generation += 1;
        let generation = state.generation;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(channel::run(self.clone(), generation, url, shutdown_rx));
        state.channel = Some(ChannelHandle {
            generation,
            shutdown,
            _task: task,
        });
        state.mode = DeliveryMode::Streaming;
    }

    fn start_polling(&self) {
        let mut state = self.lock();
        if let Some(timer) = state.poll_timer.take() {
            timer.task.abort();
        }
        state.generation += 1;
        let generation = state.generation;
        let task = tokio::spawn(polling::run(self.clone(), generation));
        state.poll_timer = Some(PollTimer { generation, task });
        state.mode = DeliveryMode::Polling;
        debug!(generation, "Continuous polling started");
    }

    fn spawn_refresh(&self) {
        let listener = self.clone();
        let task = tokio::spawn(async move {
            let _ = listener.poll_once().await;
        });
        if let Some(previous) = self.lock().refresh.replace(task) {
            previous.abort();
        }
    }

    /// Called by the polling task when its chain ends.
    pub(crate) fn polling_stopped(&self, generation: u64) {
        let mut state = self.lock();
        if state.poll_timer.as_ref().map(|t| t.generation) == Some(generation) {
            state.poll_timer = None;
            if state.mode == DeliveryMode::Polling {
                state.mode = DeliveryMode::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests;
