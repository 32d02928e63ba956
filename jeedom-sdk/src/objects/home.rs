//! Home model returned by the object, scenario and statistics methods.
//!
//! The `Raw*` structs map the JSON-RPC payloads as sent by Jeedom. The public
//! types are the trimmed, visible-only view handed to callers.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{de, CommandId, ObjectId};

/// A visible object (room, zone) with its visible equipments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JeedomObject {
    pub id: ObjectId,
    pub name: String,
    pub parent_id: Option<ObjectId>,
    /// Summary keys with at least one enabled element.
    pub summary_keys: Vec<String>,
    pub eq_logics: Vec<EqLogic>,
}

/// A visible equipment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqLogic {
    pub id: CompactString,
    pub eq_type_name: String,
    pub name: String,
    pub generic_type: Option<String>,
    pub status: EquipmentStatus,
    pub configuration_type: Option<String>,
    pub cmds: Vec<Cmd>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentStatus {
    #[serde(default)]
    pub battery: Option<Value>,
    #[serde(default, rename = "lastCommunication")]
    pub last_communication: Option<String>,
}

/// A visible command, ordered by its display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cmd {
    pub id: CommandId,
    pub current_value: Value,
    pub value: Value,
    pub unit: Option<String>,
    pub name: String,
    pub kind: String,
    pub sub_type: String,
    pub logical_id: Option<String>,
    pub eq_logic_id: Option<CompactString>,
    pub eq_type: Option<String>,
    pub generic_type: Option<String>,
    pub is_historized: bool,
    pub icon: Option<String>,
    pub order: i64,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

/// A visible scenario. Unknown fields are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(deserialize_with = "de::id")]
    pub id: CompactString,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "isVisible", default, deserialize_with = "de::flag")]
    pub is_visible: bool,
    #[serde(rename = "isActive", default, deserialize_with = "de::flag")]
    pub is_active: bool,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Minimum, average and maximum of a historized command over a period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(deserialize_with = "de::number")]
    pub min: f64,
    #[serde(deserialize_with = "de::number")]
    pub avg: f64,
    #[serde(deserialize_with = "de::number")]
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Raw payloads of `object::full`
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawObject {
    #[serde(deserialize_with = "de::id")]
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub father_id: Option<ObjectId>,
    #[serde(rename = "isVisible", default, deserialize_with = "de::flag")]
    pub is_visible: bool,
    #[serde(default)]
    pub configuration: RawObjectConfiguration,
    #[serde(rename = "eqLogics", default)]
    pub eq_logics: Vec<RawEqLogic>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawObjectConfiguration {
    #[serde(default)]
    pub summary: BTreeMap<String, Vec<RawSummaryElement>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSummaryElement {
    #[serde(default, deserialize_with = "de::flag")]
    pub enable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEqLogic {
    #[serde(deserialize_with = "de::id")]
    pub id: CompactString,
    #[serde(rename = "eqType_name", default)]
    pub eq_type_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub generic_type: Option<String>,
    #[serde(rename = "isVisible", default, deserialize_with = "de::flag")]
    pub is_visible: bool,
    #[serde(default)]
    pub status: EquipmentStatus,
    #[serde(default)]
    pub configuration: RawEqLogicConfiguration,
    #[serde(default)]
    pub cmds: Vec<RawCmd>,
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEqLogicConfiguration {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCmd {
    #[serde(deserialize_with = "de::id")]
    pub id: CommandId,
    #[serde(default)]
    pub state: Value,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub unite: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "subType", default)]
    pub sub_type: String,
    #[serde(rename = "logicalId", default)]
    pub logical_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub eq_logic_id: Option<CompactString>,
    #[serde(rename = "eqType", default)]
    pub eq_type: Option<String>,
    #[serde(default)]
    pub generic_type: Option<String>,
    #[serde(rename = "isHistorized", default, deserialize_with = "de::flag")]
    pub is_historized: bool,
    #[serde(rename = "isVisible", default, deserialize_with = "de::flag")]
    pub is_visible: bool,
    #[serde(default, deserialize_with = "de::opt_bound")]
    pub order: Option<i64>,
    #[serde(default)]
    pub display: RawCmdDisplay,
    #[serde(default)]
    pub configuration: RawCmdConfiguration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCmdDisplay {
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCmdConfiguration {
    #[serde(rename = "minValue", default, deserialize_with = "de::opt_bound")]
    pub min_value: Option<i64>,
    #[serde(rename = "maxValue", default, deserialize_with = "de::opt_bound")]
    pub max_value: Option<i64>,
}

impl RawObject {
    /// Trimmed view of the object, or `None` if it is hidden.
    pub fn into_visible(self) -> Option<JeedomObject> {
        if !self.is_visible {
            return None;
        }
        let summary_keys = self
            .configuration
            .summary
            .into_iter()
            .filter(|(_, elements)| elements.iter().any(|e| e.enable))
            .map(|(key, _)| key)
            .collect();
        let eq_logics = self
            .eq_logics
            .into_iter()
            .filter_map(RawEqLogic::into_visible)
            .collect();
        Some(JeedomObject {
            id: self.id,
            name: self.name,
            parent_id: self.father_id,
            summary_keys,
            eq_logics,
        })
    }
}

impl RawEqLogic {
    pub fn into_visible(self) -> Option<EqLogic> {
        if !self.is_visible {
            return None;
        }
        let mut cmds: Vec<RawCmd> = self.cmds.into_iter().filter(|c| c.is_visible).collect();
        // Stable sort keeps the server order for equal display orders.
        cmds.sort_by_key(|c| c.order.unwrap_or(0));
        let tags = self
            .tags
            .filter(|t| !t.is_empty())
            .map(|t| t.split(',').map(str::to_owned).collect())
            .unwrap_or_default();
        Some(EqLogic {
            id: self.id,
            eq_type_name: self.eq_type_name,
            name: self.name,
            generic_type: self.generic_type,
            status: self.status,
            configuration_type: self.configuration.kind,
            cmds: cmds.into_iter().map(Cmd::from).collect(),
            tags,
        })
    }
}

impl From<RawCmd> for Cmd {
    fn from(raw: RawCmd) -> Self {
        Self {
            id: raw.id,
            current_value: raw.state,
            value: raw.value,
            unit: raw.unite,
            name: raw.name,
            kind: raw.kind,
            sub_type: raw.sub_type,
            logical_id: raw.logical_id,
            eq_logic_id: raw.eq_logic_id,
            eq_type: raw.eq_type,
            generic_type: raw.generic_type,
            is_historized: raw.is_historized,
            icon: raw.display.icon,
            order: raw.order.unwrap_or(0),
            min_value: raw.configuration.min_value,
            max_value: raw.configuration.max_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": "1",
            "name": "Salon",
            "father_id": null,
            "isVisible": "1",
            "configuration": {
                "summary": {
                    "temperature": [{"enable": "1"}],
                    "light": [{"enable": "0"}],
                }
            },
            "eqLogics": [
                {
                    "id": "10",
                    "eqType_name": "virtual",
                    "name": "Thermostat",
                    "isVisible": "1",
                    "status": {"battery": 80, "lastCommunication": "2023-11-14 22:13:20"},
                    "configuration": {"type": "thermostat"},
                    "tags": "heating,ground",
                    "cmds": [
                        {"id": "101", "name": "Consigne", "type": "action", "subType": "slider",
                         "isVisible": "1", "order": "2", "display": {}, "configuration": {"minValue": "5", "maxValue": "30"}},
                        {"id": "100", "name": "Température", "type": "info", "subType": "numeric",
                         "state": 19.5, "isVisible": "1", "isHistorized": "1", "order": "1", "unite": "°C",
                         "display": {"icon": "<i class=\"fa fa-thermometer\"></i>"}, "configuration": {"minValue": "", "maxValue": ""}},
                        {"id": "102", "name": "Hidden", "isVisible": "0"},
                    ],
                },
                {"id": "11", "name": "Hidden", "isVisible": "0"},
            ],
        })
    }

    #[test]
    fn test_visible_object_mapping() {
        let raw: RawObject = serde_json::from_value(sample()).unwrap();
        let object = raw.into_visible().unwrap();
        assert_eq!(object.summary_keys, vec!["temperature".to_string()]);
        assert_eq!(object.eq_logics.len(), 1);

        let eq = &object.eq_logics[0];
        assert_eq!(eq.tags, vec!["heating", "ground"]);
        assert_eq!(eq.configuration_type.as_deref(), Some("thermostat"));
        let ids: Vec<&str> = eq.cmds.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["100", "101"]);
        assert_eq!(eq.cmds[0].current_value, json!(19.5));
        assert_eq!(eq.cmds[0].min_value, None);
        assert_eq!(eq.cmds[1].min_value, Some(5));
        assert_eq!(eq.cmds[1].max_value, Some(30));
    }

    #[test]
    fn test_hidden_object_dropped() {
        let raw: RawObject =
            serde_json::from_value(json!({"id": 2, "name": "Cave", "isVisible": "0"})).unwrap();
        assert!(raw.into_visible().is_none());
    }

    #[test]
    fn test_statistics_from_strings() {
        let stats: Statistics =
            serde_json::from_value(json!({"min": "12.5", "avg": "18.25", "max": 24})).unwrap();
        assert_eq!(stats.avg, 18.25);
        assert_eq!(stats.max, 24.0);
    }
}
