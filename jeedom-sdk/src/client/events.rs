//! Event polling.

use serde_json::Value;

use super::rpc::params;
use super::{JeedomClient, RpcError};
use crate::objects::EventBatch;

/// JSON-RPC method returning the events raised since a timestamp.
pub const EVENT_CHANGES_METHOD: &str = "event::changes";

impl JeedomClient {
    /// `event::changes` – events raised since `datetime` (seconds since the
    /// Unix epoch, as returned in a previous [`EventBatch`]).
    pub async fn event_changes(&self, datetime: f64) -> Result<EventBatch, RpcError> {
        self.call_as(EVENT_CHANGES_METHOD, params([("datetime", Value::from(datetime))]))
            .await
    }
}
