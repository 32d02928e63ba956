//! Raw batch → [`DecodedBatch`].

use std::collections::HashMap;

use jeedom_sdk::objects::{
    CmdUpdateOption, CommandId, EventBatch, SummaryUpdateOption, CMD_UPDATE_EVENT,
    SUMMARY_UPDATE_EVENT,
};
use thiserror::Error;

use super::types::{CommandUpdate, Cursor, DecodedBatch, DecodedDelta, SummaryUpdate};

/// A pushed frame that is not an event batch. The whole message is dropped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid event batch: {0}")]
    Batch(#[source] serde_json::Error),
}

/// Parse a pushed text frame and decode it.
pub fn decode_text(text: &str) -> Result<DecodedBatch, DecodeError> {
    let batch: EventBatch = serde_json::from_str(text).map_err(DecodeError::Batch)?;
    Ok(decode(batch))
}

/// Decode a raw batch.
///
/// Unknown event names are skipped, and so are known events whose option
/// does not parse; the rest of the batch still applies. When the same
/// command is updated more than once in a batch only the last update is
/// kept, at the position of that last occurrence. The cursor always moves
/// to the batch timestamp, even for an empty batch.
pub fn decode(batch: EventBatch) -> DecodedBatch {
    let mut slots: Vec<Option<DecodedDelta>> = Vec::with_capacity(batch.result.len());
    let mut last_cmd_slot: HashMap<CommandId, usize> = HashMap::new();

    for event in batch.result {
        match event.name.as_str() {
            CMD_UPDATE_EVENT => {
                let option: CmdUpdateOption = match serde_json::from_value(event.option) {
                    Ok(option) => option,
                    Err(e) => {
                        tracing::warn!(event = CMD_UPDATE_EVENT, error = %e, "Skipping malformed event");
                        continue;
                    }
                };
                if let Some(previous) = last_cmd_slot.insert(option.cmd_id.clone(), slots.len()) {
                    slots[previous] = None;
                }
                slots.push(Some(DecodedDelta::ValueUpdate(CommandUpdate {
                    command_id: option.cmd_id,
                    new_value: option.value,
                    collected_at: option.collect_date,
                })));
            }
            SUMMARY_UPDATE_EVENT => {
                let option: SummaryUpdateOption = match serde_json::from_value(event.option) {
                    Ok(option) => option,
                    Err(e) => {
                        tracing::warn!(event = SUMMARY_UPDATE_EVENT, error = %e, "Skipping malformed event");
                        continue;
                    }
                };
                for (key, entry) in option.keys {
                    slots.push(Some(DecodedDelta::SummaryUpdate(SummaryUpdate {
                        object_id: option.object_id.clone(),
                        key,
                        value: entry.value,
                    })));
                }
            }
            other => {
                tracing::trace!(event = other, "Ignoring event");
            }
        }
    }

    DecodedBatch {
        cursor: Cursor::from_secs(batch.datetime),
        deltas: slots.into_iter().flatten().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(value: serde_json::Value) -> EventBatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_batch_advances_cursor() {
        let decoded = decode(batch(json!({"datetime": 1700000123.5, "result": []})));
        assert_eq!(decoded.cursor, Cursor::from_secs(1_700_000_123.5));
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_unknown_events_ignored() {
        let decoded = decode(batch(json!({
            "datetime": 10,
            "result": [
                {"name": "eqLogic::update", "option": {"eqLogic_id": 4}},
                {"name": "scenario::update", "option": {"scenario_id": 2, "state": "stop"}},
                {"name": "cmd::update", "option": {"cmd_id": "5", "value": 1}},
            ],
        })));
        assert_eq!(decoded.deltas.len(), 1);
    }

    #[test]
    fn test_duplicate_command_keeps_last_value() {
        let decoded = decode(batch(json!({
            "datetime": 10,
            "result": [
                {"name": "cmd::update", "option": {"cmd_id": "5", "value": 1}},
                {"name": "cmd::update", "option": {"cmd_id": "6", "value": "on"}},
                {"name": "cmd::update", "option": {"cmd_id": 5, "value": 2, "collectDate": "2024-01-01 00:00:02"}},
            ],
        })));
        let updates: Vec<&CommandUpdate> = decoded.command_updates().collect();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].command_id, "6");
        assert_eq!(updates[1].command_id, "5");
        assert_eq!(updates[1].new_value, json!(2));
        assert_eq!(updates[1].collected_at.as_deref(), Some("2024-01-01 00:00:02"));
    }

    #[test]
    fn test_same_value_twice_is_still_one_update() {
        let decoded = decode(batch(json!({
            "datetime": 10,
            "result": [
                {"name": "cmd::update", "option": {"cmd_id": "5", "value": 1}},
                {"name": "cmd::update", "option": {"cmd_id": "5", "value": 1}},
            ],
        })));
        assert_eq!(decoded.command_updates().count(), 1);
    }

    #[test]
    fn test_summary_event_fans_out_per_key() {
        let decoded = decode(batch(json!({
            "datetime": 10,
            "result": [
                {"name": "jeeObject::summary::update", "option": {
                    "object_id": 3,
                    "keys": {"temperature": {"value": 20.5}, "light": {"value": 1}},
                }},
            ],
        })));
        let summaries: Vec<&SummaryUpdate> = decoded.summary_updates().collect();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.object_id == "3"));
        assert!(summaries.iter().any(|s| s.key == "temperature" && s.value == json!(20.5)));
    }

    #[test]
    fn test_malformed_event_skipped_rest_applies() {
        let decoded = decode(batch(json!({
            "datetime": 60,
            "result": [
                {"name": "cmd::update", "option": {"value": 1}},
                {"name": "jeeObject::summary::update", "option": {"keys": "nope"}},
                {"name": "cmd::update", "option": {"cmd_id": "9", "value": 7}},
            ],
        })));
        assert_eq!(decoded.cursor, Cursor::from_secs(60.0));
        let updates: Vec<&CommandUpdate> = decoded.command_updates().collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].command_id, "9");
        assert_eq!(decoded.summary_updates().count(), 0);
    }

    #[test]
    fn test_decode_text_rejects_garbage() {
        assert!(matches!(decode_text("not json"), Err(DecodeError::Batch(_))));
        assert!(matches!(decode_text(r#"{"result":[]}"#), Err(DecodeError::Batch(_))));
    }
}
