//! JSON-RPC 2.0 envelope used by the Jeedom `core/api/jeeApi.php` endpoint.
//!
//! ```json
//! {"jsonrpc":"2.0","id":1700000000000,"method":"event::changes","params":{"datetime":1700000000.5,"apikey":"..."}}
//! ```
//!
//! The response carries exactly one of `result` or `error`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Name of the JSON-RPC parameter carrying the API key.
pub const API_KEY_PARAM: &str = "apikey";

/// The only method that may be called without an API key: it is the one
/// that obtains it.
pub const GET_API_KEY_METHOD: &str = "user::getHash";

/// Outgoing request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Map<String, Value>,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Map<String, Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Server-reported business error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Incoming response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    /// `Some(Value::Null)` for `"result": null`, `None` when absent.
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Why an envelope carries no usable result.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeError {
    Remote(RpcErrorObject),
    /// Neither `result` nor `error`.
    Empty,
}

impl RpcResponse {
    /// Split the envelope into the result or the remote error. An `error`
    /// member wins over a `result`.
    pub fn into_result(self) -> Result<Value, EnvelopeError> {
        match (self.error, self.result) {
            (Some(error), _) => Err(EnvelopeError::Remote(error)),
            (None, Some(result)) => Ok(result),
            (None, None) => Err(EnvelopeError::Empty),
        }
    }
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Whether `method` requires an API key to be attached.
pub fn requires_api_key(method: &str) -> bool {
    method != GET_API_KEY_METHOD
}
