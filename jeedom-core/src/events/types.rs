//! Decoded event types.

use jeedom_sdk::objects::{CommandId, ObjectId};
use serde::Serialize;
use serde_json::Value;

/// Timestamp of the last applied batch, in seconds since the Unix epoch.
///
/// Sent back as the `datetime` parameter of the next poll.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Cursor(f64);

impl Cursor {
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let now = time::OffsetDateTime::now_utc();
        Self(now.unix_timestamp_nanos() as f64 / 1e9)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// New value of a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandUpdate {
    pub command_id: CommandId,
    pub new_value: Value,
    /// Collection timestamp as formatted by the server, if any.
    pub collected_at: Option<String>,
}

/// New value of one key of an object summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryUpdate {
    pub object_id: ObjectId,
    pub key: String,
    pub value: Value,
}

/// The only unit handed over to the [`EventSink`](crate::EventSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedDelta {
    ValueUpdate(CommandUpdate),
    SummaryUpdate(SummaryUpdate),
}

/// A decoded batch: the cursor to resume from and the ordered deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBatch {
    pub cursor: Cursor,
    pub deltas: Vec<DecodedDelta>,
}

impl DecodedBatch {
    pub fn into_parts(self) -> (Cursor, Vec<DecodedDelta>) {
        (self.cursor, self.deltas)
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn command_updates(&self) -> impl Iterator<Item = &CommandUpdate> {
        self.deltas.iter().filter_map(|d| match d {
            DecodedDelta::ValueUpdate(u) => Some(u),
            DecodedDelta::SummaryUpdate(_) => None,
        })
    }

    pub fn summary_updates(&self) -> impl Iterator<Item = &SummaryUpdate> {
        self.deltas.iter().filter_map(|d| match d {
            DecodedDelta::SummaryUpdate(u) => Some(u),
            DecodedDelta::ValueUpdate(_) => None,
        })
    }
}
