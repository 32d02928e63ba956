//! Interactions and system messages.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::rpc::params;
use super::{JeedomClient, RpcError};
use crate::objects::CommandId;

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    reply: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Sentence {
    query: String,
}

impl JeedomClient {
    /// `interact::tryToReply` – ask a natural-language question.
    ///
    /// Fails with [`RpcError::Unexpected`] when the server finds no reply.
    pub async fn ask_question(
        &self,
        query: &str,
        reply_cmd: Option<&CommandId>,
    ) -> Result<String, RpcError> {
        let mut p = params([("query", Value::from(query))]);
        if let Some(reply_cmd) = reply_cmd {
            p.insert("reply_cmd".to_owned(), Value::from(reply_cmd.as_str()));
        }
        let result: Reply = self.call_as("interact::tryToReply", p).await?;
        match result.reply {
            Some(reply) if !reply.is_empty() => Ok(reply),
            _ => {
                tracing::error!(query, "No reply found");
                Err(RpcError::Unexpected("no reply found".to_owned()))
            }
        }
    }

    /// `interactQuery::all` – the sentences the interaction engine knows.
    pub async fn get_sentences(&self) -> Result<Vec<String>, RpcError> {
        let sentences: Vec<Sentence> = self.call_as("interactQuery::all", Map::new()).await?;
        Ok(sentences.into_iter().map(|s| s.query).collect())
    }

    /// `message::all` – system notifications, as sent by the server.
    pub async fn get_notifications(&self) -> Result<Vec<Value>, RpcError> {
        self.call_as("message::all", Map::new()).await
    }

    /// `message::removeAll` – delete every system notification.
    pub async fn clear_notifications(&self) -> Result<(), RpcError> {
        let result = self.call("message::removeAll", Map::new()).await?;
        if result != "ok" {
            return Err(RpcError::Unexpected(format!(
                "notification removal answered {result}"
            )));
        }
        Ok(())
    }
}
