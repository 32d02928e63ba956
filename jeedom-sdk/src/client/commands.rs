//! Commands, history and scenarios.

use serde_json::{Map, Value};
use time::macros::format_description;
use time::OffsetDateTime;

use super::rpc::params;
use super::{JeedomClient, RpcError};
use crate::objects::{CommandId, Scenario, Statistics};

/// Default statistics window when no start time is given.
pub const DEFAULT_STATISTICS_PERIOD: time::Duration = time::Duration::days(1);

/// Default history window when no start time is given.
pub const DEFAULT_HISTORY_PERIOD: time::Duration = time::Duration::days(1);

/// Scenario state transitions accepted by `scenario::changeState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Run,
    Stop,
    Enable,
    Disable,
}

impl ScenarioState {
    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioState::Run => "run",
            ScenarioState::Stop => "stop",
            ScenarioState::Enable => "enable",
            ScenarioState::Disable => "disable",
        }
    }
}

impl JeedomClient {
    /// `cmd::execCmd` – execute an action command.
    pub async fn exec_cmd(
        &self,
        cmd_id: &CommandId,
        options: Option<Map<String, Value>>,
    ) -> Result<Value, RpcError> {
        let mut p = params([("id", Value::from(cmd_id.as_str()))]);
        if let Some(options) = options {
            p.insert("options".to_owned(), Value::Object(options));
        }
        self.call("cmd::execCmd", p)
            .await
            .inspect_err(|e| tracing::error!(error = %e, %cmd_id, "Failed to execute command"))
    }

    /// `cmd::getStatistique` – min/avg/max of a historized command.
    ///
    /// `end` defaults to now and `start` to `period` before `end`.
    pub async fn get_statistics(
        &self,
        cmd_id: &CommandId,
        start: Option<OffsetDateTime>,
        end: Option<OffsetDateTime>,
        period: Option<time::Duration>,
    ) -> Result<Statistics, RpcError> {
        let p = period_params(
            cmd_id,
            start,
            end,
            period.unwrap_or(DEFAULT_STATISTICS_PERIOD),
        )?;
        self.call_as("cmd::getStatistique", p).await
    }

    /// `cmd::getHistory` – raw history points of a historized command.
    pub async fn get_history(
        &self,
        cmd_id: &CommandId,
        start: Option<OffsetDateTime>,
        end: Option<OffsetDateTime>,
    ) -> Result<Value, RpcError> {
        let p = period_params(cmd_id, start, end, DEFAULT_HISTORY_PERIOD)?;
        self.call("cmd::getHistory", p).await
    }

    /// `scenario::all` – visible scenarios only.
    pub async fn get_scenarios(&self) -> Result<Vec<Scenario>, RpcError> {
        let scenarios: Vec<Scenario> = self.call_as("scenario::all", Map::new()).await?;
        Ok(scenarios.into_iter().filter(|s| s.is_visible).collect())
    }

    /// `scenario::changeState` – run, stop, enable or disable a scenario.
    pub async fn change_scenario_state(
        &self,
        scenario_id: &str,
        state: ScenarioState,
    ) -> Result<Value, RpcError> {
        self.call(
            "scenario::changeState",
            params([
                ("id", Value::from(scenario_id)),
                ("state", Value::from(state.as_str())),
            ]),
        )
        .await
    }
}

/// `{id, startTime, endTime}` with Jeedom's `YYYY-MM-DD HH:MM:SS` timestamps.
fn period_params(
    cmd_id: &CommandId,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    period: time::Duration,
) -> Result<Map<String, Value>, RpcError> {
    let end = end.unwrap_or_else(OffsetDateTime::now_utc);
    let start = start.unwrap_or(end - period);
    let id: i64 = cmd_id
        .parse()
        .map_err(|_| RpcError::Unexpected(format!("command id {cmd_id} is not numeric")))?;
    Ok(params([
        ("id", Value::from(id)),
        ("startTime", Value::from(format_timestamp(start)?)),
        ("endTime", Value::from(format_timestamp(end)?)),
    ]))
}

fn format_timestamp(at: OffsetDateTime) -> Result<String, RpcError> {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .map_err(|e| RpcError::Unexpected(e.to_string()))
}
