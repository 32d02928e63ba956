//! Credential acquisition.

use serde_json::Value;

use super::rpc::params;
use super::{JeedomClient, RpcError};
use crate::objects::rpc::GET_API_KEY_METHOD;
use crate::objects::ApiKey;

impl JeedomClient {
    /// `user::getHash` – exchange a login/password for the user's API key.
    ///
    /// The key is returned, not stored; call
    /// [`set_api_key`](JeedomClient::set_api_key) to use it.
    pub async fn get_api_key(&self, login: &str, password: &str) -> Result<ApiKey, RpcError> {
        let hash: String = self
            .call_as(
                GET_API_KEY_METHOD,
                params([
                    ("login", Value::from(login)),
                    ("password", Value::from(password)),
                ]),
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, login, "Failed to get API key"))?;
        Ok(ApiKey::new(hash))
    }
}
