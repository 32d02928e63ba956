//! JSON-RPC client for the Jeedom API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod commands;
mod events;
mod home;
mod interact;
mod rpc;
mod user;

pub use commands::{ScenarioState, DEFAULT_HISTORY_PERIOD, DEFAULT_STATISTICS_PERIOD};
pub use events::EVENT_CHANGES_METHOD;
pub use rpc::JeedomClient;

use reqwest::StatusCode;

/// Errors produced by the JSON-RPC client.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// No API key is set and the method requires one.
    #[error("missing API key for method {method}")]
    AuthRequired { method: String },

    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("http status {status}, body: {body}")]
    Status { status: StatusCode, body: String },

    /// The response envelope carried an `error` member, passed on as is.
    #[error("remote error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The response body or result could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The result was well-formed but not what the method promises.
    #[error("unexpected result: {0}")]
    Unexpected(String),
}

impl RpcError {
    /// Network or HTTP level failure, as opposed to a business error.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Http(_) | RpcError::Status { .. })
    }
}
