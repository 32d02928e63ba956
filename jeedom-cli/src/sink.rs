//! Sink that logs every event before storing it.

use std::sync::Arc;

use jeedom_core::{CommandUpdate, EventSink, MemoryStore};
use jeedom_sdk::objects::ObjectId;
use serde_json::Value;

pub struct LoggingSink {
    store: Arc<MemoryStore>,
}

impl LoggingSink {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

impl EventSink for LoggingSink {
    fn report_listener_status(&self, listening: bool) {
        tracing::info!(listening, "Listener status");
        self.store.report_listener_status(listening);
    }

    fn report_auth_failure(&self) {
        tracing::error!("Authentication failed, check the API key");
        self.store.report_auth_failure();
    }

    fn report_communication_error(&self) {
        tracing::error!("Communication error with the Jeedom box");
        self.store.report_communication_error();
    }

    fn apply_command_updates(&self, updates: Vec<CommandUpdate>) {
        for update in &updates {
            tracing::info!(
                cmd = %update.command_id,
                value = %update.new_value,
                collected_at = update.collected_at.as_deref(),
                "Command updated"
            );
        }
        self.store.apply_command_updates(updates);
    }

    fn apply_object_summary_update(&self, object_id: &ObjectId, key: &str, value: &Value) {
        tracing::info!(object = %object_id, key, %value, "Summary updated");
        self.store.apply_object_summary_update(object_id, key, value);
    }
}
