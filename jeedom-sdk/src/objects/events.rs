//! Event stream message types.
//!
//! The same [`EventBatch`] shape is delivered by the `event::changes`
//! JSON-RPC method and pushed as text frames on the event WebSocket.
//!
//! # Protocol
//!
//! 1. The client opens the WebSocket and sends an [`AuthFrame`] as its
//!    first text frame.
//! 2. The server pushes an [`EventBatch`] JSON frame whenever something
//!    changes.
//! 3. The connection ends with a close frame; see [`WsCloseCode`] for the
//!    codes the client reacts to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{de, CommandId, ObjectId};

/// Event name for a command value change.
pub const CMD_UPDATE_EVENT: &str = "cmd::update";

/// Event name for an object summary change.
pub const SUMMARY_UPDATE_EVENT: &str = "jeeObject::summary::update";

/// A batch of raw events and the server timestamp it was cut at.
///
/// ```json
/// {"datetime":1700000000.123,"result":[{"name":"cmd::update","option":{"cmd_id":"12","value":21.5,"collectDate":"2023-11-14 22:13:20"}}]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    /// Seconds since the Unix epoch, fractional.
    #[serde(deserialize_with = "de::number")]
    pub datetime: f64,
    #[serde(default)]
    pub result: Vec<RawEvent>,
}

/// A single raw event. `option` is interpreted according to `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub name: String,
    #[serde(default)]
    pub option: Value,
}

/// `option` payload of a [`CMD_UPDATE_EVENT`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CmdUpdateOption {
    #[serde(deserialize_with = "de::id")]
    pub cmd_id: CommandId,
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "collectDate", default)]
    pub collect_date: Option<String>,
}

/// `option` payload of a [`SUMMARY_UPDATE_EVENT`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummaryUpdateOption {
    #[serde(deserialize_with = "de::id")]
    pub object_id: ObjectId,
    #[serde(default)]
    pub keys: BTreeMap<String, SummaryKeyValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummaryKeyValue {
    #[serde(default)]
    pub value: Value,
}

/// First frame sent by the client after the socket opens.
#[derive(Debug, Clone, Serialize)]
pub struct AuthFrame<'a> {
    #[serde(rename = "apiKey")]
    pub api_key: &'a str,
}

/// WebSocket close codes the event client dispatches on.
///
/// See [RFC 6455 §7.4.1](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.1).
pub struct WsCloseCode;

impl WsCloseCode {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;

    /// The endpoint is going away (server shutdown, page navigation).
    pub const GOING_AWAY: u16 = 1001;

    /// A close frame was received without a status code.
    pub const NO_STATUS: u16 = 1005;

    /// The connection dropped without a close frame.
    pub const ABNORMAL: u16 = 1006;
}
