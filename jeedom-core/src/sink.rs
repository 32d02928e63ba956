//! The application-state collaborator.
//!
//! [`EventSink`] is everything the listener needs from the outside world:
//! somewhere to apply deltas and somewhere to report connectivity and
//! failures. [`MemoryStore`] is a plain in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use jeedom_sdk::objects::ObjectId;
use serde_json::Value;

use crate::events::CommandUpdate;

/// Receiver of decoded events and listener status.
///
/// Calls are made from the listener's tasks and must not block.
pub trait EventSink: Send + Sync {
    /// Whether events are currently being received.
    fn report_listener_status(&self, listening: bool);

    /// No credential was available. Implementations are expected to notify
    /// the user and drop their login state.
    fn report_auth_failure(&self);

    /// A poll failed. Implementations are expected to notify the user.
    fn report_communication_error(&self);

    /// All command updates of one batch, in batch order.
    fn apply_command_updates(&self, updates: Vec<CommandUpdate>);

    fn apply_object_summary_update(&self, object_id: &ObjectId, key: &str, value: &Value);
}

/// Severity of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Danger,
}

/// A user-visible message raised by the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

pub const AUTH_FAILURE_MESSAGE: &str = "Authentication error, please log in again";
pub const COMMUNICATION_ERROR_MESSAGE: &str = "Communication error with the server";

#[derive(Debug, Clone, PartialEq)]
pub struct CommandState {
    pub value: Value,
    pub collected_at: Option<String>,
}

#[derive(Debug, Default)]
struct StoreState {
    commands: HashMap<String, CommandState>,
    summaries: HashMap<(String, String), Value>,
    listening: bool,
    authenticated: bool,
    status_reports: Vec<bool>,
    notifications: Vec<Notification>,
    command_batches: usize,
    summary_updates: usize,
}

/// In-memory application state.
///
/// Keeps the last value of every command and object summary key, plus the
/// listener status and login flag the UI would display. Also counts calls,
/// which is handy for assertions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.with(|s| s.authenticated = authenticated);
    }

    pub fn is_authenticated(&self) -> bool {
        self.with(|s| s.authenticated)
    }

    pub fn is_listening(&self) -> bool {
        self.with(|s| s.listening)
    }

    /// Every status reported so far, oldest first.
    pub fn status_reports(&self) -> Vec<bool> {
        self.with(|s| s.status_reports.clone())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.with(|s| s.notifications.clone())
    }

    pub fn command(&self, command_id: &str) -> Option<CommandState> {
        self.with(|s| s.commands.get(command_id).cloned())
    }

    pub fn command_value(&self, command_id: &str) -> Option<Value> {
        self.command(command_id).map(|c| c.value)
    }

    pub fn object_summary(&self, object_id: &str, key: &str) -> Option<Value> {
        self.with(|s| {
            s.summaries
                .get(&(object_id.to_owned(), key.to_owned()))
                .cloned()
        })
    }

    /// Number of `apply_command_updates` calls.
    pub fn command_batches(&self) -> usize {
        self.with(|s| s.command_batches)
    }

    /// Number of `apply_object_summary_update` calls.
    pub fn summary_updates(&self) -> usize {
        self.with(|s| s.summary_updates)
    }

    pub fn command_count(&self) -> usize {
        self.with(|s| s.commands.len())
    }

    /// Drop all application data (logout).
    pub fn clear(&self) {
        self.with(|s| *s = StoreState::default());
    }
}

impl EventSink for MemoryStore {
    fn report_listener_status(&self, listening: bool) {
        self.with(|s| {
            s.listening = listening;
            s.status_reports.push(listening);
        });
    }

    fn report_auth_failure(&self) {
        tracing::warn!("Missing API key");
        self.with(|s| {
            s.authenticated = false;
            s.notifications.push(Notification {
                kind: NotificationKind::Danger,
                message: AUTH_FAILURE_MESSAGE.to_owned(),
            });
        });
    }

    fn report_communication_error(&self) {
        self.with(|s| {
            s.notifications.push(Notification {
                kind: NotificationKind::Danger,
                message: COMMUNICATION_ERROR_MESSAGE.to_owned(),
            });
        });
    }

    fn apply_command_updates(&self, updates: Vec<CommandUpdate>) {
        self.with(|s| {
            s.command_batches += 1;
            for update in updates {
                s.commands.insert(
                    update.command_id.to_string(),
                    CommandState {
                        value: update.new_value,
                        collected_at: update.collected_at,
                    },
                );
            }
        });
    }

    fn apply_object_summary_update(&self, object_id: &ObjectId, key: &str, value: &Value) {
        self.with(|s| {
            s.summary_updates += 1;
            s.summaries
                .insert((object_id.to_string(), key.to_owned()), value.clone());
        });
    }
}
