//! Objects and summaries.

use serde_json::{Map, Value};

use super::rpc::params;
use super::{JeedomClient, RpcError};
use crate::objects::home::RawObject;
use crate::objects::{JeedomObject, ObjectId};

impl JeedomClient {
    /// `object::full` – every visible object with its visible equipments
    /// and visible commands.
    pub async fn get_objects(&self) -> Result<Vec<JeedomObject>, RpcError> {
        let raw: Vec<RawObject> = self.call_as("object::full", Map::new()).await?;
        Ok(raw.into_iter().filter_map(RawObject::into_visible).collect())
    }

    /// `summary::global` – the global summary, as sent by the server.
    pub async fn get_summary(&self) -> Result<Value, RpcError> {
        self.call("summary::global", Map::new()).await
    }

    /// `summary::byId` – one summary key of one object.
    pub async fn get_object_summary(&self, object_id: &ObjectId, key: &str) -> Result<Value, RpcError> {
        self.call(
            "summary::byId",
            params([
                ("id", Value::from(object_id.as_str())),
                ("key", Value::from(key)),
            ]),
        )
        .await
    }
}
