//! Transport layer: one HTTP POST per JSON-RPC call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use super::RpcError;
use crate::objects::rpc::{requires_api_key, API_KEY_PARAM};
use crate::objects::{ApiKey, EnvelopeError, RpcRequest, RpcResponse};

/// Typed client for the Jeedom JSON-RPC API.
///
/// Clones share the API key and the request id sequence, so replacing the
/// key on one handle (after a re-login) is seen by all of them.
#[derive(Debug, Clone)]
pub struct JeedomClient {
    http: Client,
    endpoint: Url,
    api_key: Arc<RwLock<Option<ApiKey>>>,
    next_id: Arc<AtomicU64>,
}

impl JeedomClient {
    /// Create a new `JeedomClient`.
    ///
    /// * `endpoint` – full URL of the JSON-RPC endpoint
    ///   (e.g. `https://jeedom.local/core/api/jeeApi.php`).
    pub fn new(endpoint: Url) -> Self {
        let seed = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Self {
            http: Client::new(),
            endpoint,
            api_key: Arc::new(RwLock::new(None)),
            next_id: Arc::new(AtomicU64::new(u64::try_from(seed).unwrap_or(1))),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Set or replace the API key attached to every call.
    pub fn set_api_key(&self, api_key: impl Into<ApiKey>) {
        *self.api_key.write().unwrap_or_else(PoisonError::into_inner) = Some(api_key.into());
    }

    /// Forget the API key (logout).
    pub fn clear_api_key(&self) {
        *self.api_key.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn api_key(&self) -> Option<ApiKey> {
        self.api_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Issue one JSON-RPC call and return its `result`.
    ///
    /// Single attempt: failures are returned to the caller as-is.
    pub async fn call(&self, method: &str, params: Map<String, Value>) -> Result<Value, RpcError> {
        let mut params = params;
        if requires_api_key(method) {
            let Some(api_key) = self.api_key() else {
                return Err(RpcError::AuthRequired {
                    method: method.to_owned(),
                });
            };
            params.insert(API_KEY_PARAM.to_owned(), Value::String(api_key.as_str().to_owned()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        tracing::debug!(method, id, "JSON-RPC call");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::Status { status, body });
        }
        let bytes = resp.bytes().await?;
        let envelope: RpcResponse = serde_json::from_slice(&bytes)?;
        unwrap_envelope(method, envelope)
    }

    /// [`call`](Self::call) and deserialize the result into `T`.
    pub(super) async fn call_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<T, RpcError> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(RpcError::Json)
    }
}

fn unwrap_envelope(method: &str, envelope: RpcResponse) -> Result<Value, RpcError> {
    envelope.into_result().map_err(|error| match error {
        EnvelopeError::Remote(error) => {
            tracing::debug!(method, code = error.code, message = %error.message, "JSON-RPC business error");
            RpcError::Remote {
                code: error.code,
                message: error.message,
                data: error.data,
            }
        }
        EnvelopeError::Empty => {
            RpcError::Unexpected(format!("{method}: response carries neither result nor error"))
        }
    })
}

/// Build a params object from `(name, value)` pairs.
pub(super) fn params<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}
