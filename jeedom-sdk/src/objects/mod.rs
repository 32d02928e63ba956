pub mod de;
pub mod events;
pub mod home;
pub mod rpc;

pub use events::{
    AuthFrame, CmdUpdateOption, EventBatch, RawEvent, SummaryKeyValue, SummaryUpdateOption,
    WsCloseCode, CMD_UPDATE_EVENT, SUMMARY_UPDATE_EVENT,
};
pub use home::{Cmd, EqLogic, EquipmentStatus, JeedomObject, Scenario, Statistics};
pub use rpc::{EnvelopeError, RpcErrorObject, RpcRequest, RpcResponse};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Identifier of a Jeedom command (`cmd`).
pub type CommandId = CompactString;

/// Identifier of a Jeedom object (room / zone).
pub type ObjectId = CompactString;

/// User API key used to authenticate every JSON-RPC call and the event
/// socket handshake.
///
/// The `Debug` impl never prints the key itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
