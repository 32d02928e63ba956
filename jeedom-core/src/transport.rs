//! The RPC seam the listener polls through.

use async_trait::async_trait;
use jeedom_sdk::client::{JeedomClient, RpcError};
use jeedom_sdk::objects::{ApiKey, EventBatch};

use crate::events::Cursor;

/// What the listener needs from the JSON-RPC transport: the current
/// credential (also used for the socket handshake) and the
/// events-since-cursor call.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    fn api_key(&self) -> Option<ApiKey>;

    /// Events raised since `since`. Single attempt.
    async fn fetch_events(&self, since: Cursor) -> Result<EventBatch, RpcError>;
}

#[async_trait]
impl RpcTransport for JeedomClient {
    fn api_key(&self) -> Option<ApiKey> {
        JeedomClient::api_key(self)
    }

    async fn fetch_events(&self, since: Cursor) -> Result<EventBatch, RpcError> {
        self.event_changes(since.as_secs()).await
    }
}
