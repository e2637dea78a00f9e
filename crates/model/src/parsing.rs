//! Parsers for `juju ... --format json` output.
//!
//! These are pure functions over CLI stdout so that every shape the CLI
//! produces (juju 2.9 and 3.x) can be covered by unit tests without a
//! controller.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use dashprobe_core::error::{ModelError, ReleaseError};
use dashprobe_core::release::series_from_channel;
use dashprobe_core::types::{ActionOutcome, ActionStatus, CommandOutcome};

/// Top level of `juju status --format json`.
#[derive(Debug, Default, Deserialize)]
pub struct ModelStatus {
    #[serde(default)]
    pub applications: BTreeMap<String, ApplicationStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationStatus {
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub base: Option<Base>,
    #[serde(default)]
    pub units: BTreeMap<String, UnitStatus>,
}

/// juju 3.0 reports `{"name": "ubuntu", "channel": "22.04"}`, 3.1+ `"ubuntu@22.04"`.
/// Only the channel is kept.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Base {
    Plain(String),
    Structured { channel: String },
}

#[derive(Debug, Default, Deserialize)]
pub struct UnitStatus {
    #[serde(default, rename = "public-address")]
    pub public_address: Option<String>,
    #[serde(default)]
    pub leader: Option<bool>,
    #[serde(default)]
    pub subordinates: BTreeMap<String, UnitStatus>,
}

impl ModelStatus {
    /// Parses `juju status --format json` stdout.
    pub fn parse(stdout: &str) -> Result<Self, ModelError> {
        serde_json::from_str(stdout).map_err(|e| output_error("juju status", e))
    }

    /// Names of all applications in the model.
    pub fn application_names(&self) -> Vec<String> {
        self.applications.keys().cloned().collect()
    }

    /// Units of `application`, ordered by unit number.
    ///
    /// Subordinate applications have no `units` of their own: their units are
    /// listed under each principal unit's `subordinates`.
    pub fn units(&self, application: &str) -> Result<Vec<String>, ModelError> {
        let app = self
            .applications
            .get(application)
            .ok_or_else(|| ModelError::ApplicationNotFound(application.to_owned()))?;

        let mut units: Vec<String> = app.units.keys().cloned().collect();
        if units.is_empty() {
            let prefix = format!("{application}/");
            for principal in self.applications.values() {
                for unit in principal.units.values() {
                    units.extend(
                        unit.subordinates
                            .keys()
                            .filter(|name| name.starts_with(&prefix))
                            .cloned(),
                    );
                }
            }
        }

        units.sort_by_key(|name| unit_number(name));
        units.dedup();
        Ok(units)
    }

    /// Public address of `unit`, searching principal and subordinate entries.
    pub fn public_address(&self, unit: &str) -> Result<String, ModelError> {
        self.find_unit(unit)
            .and_then(|status| status.public_address.clone())
            .filter(|addr| !addr.is_empty())
            .ok_or_else(|| ModelError::UnitNotFound(unit.to_owned()))
    }

    /// Ubuntu series of `application` derived from `series` or `base`.
    pub fn series(&self, application: &str) -> Result<String, ModelError> {
        let app = self
            .applications
            .get(application)
            .ok_or_else(|| ModelError::ApplicationNotFound(application.to_owned()))?;

        if let Some(series) = app.series.as_deref().filter(|s| !s.is_empty()) {
            return Ok(series.to_owned());
        }

        let channel = match &app.base {
            Some(Base::Plain(base)) => base.split_once('@').map_or(base.as_str(), |(_, c)| c),
            Some(Base::Structured { channel, .. }) => channel.as_str(),
            None => {
                return Err(ModelError::Output {
                    command: "juju status".to_owned(),
                    reason: format!("application '{application}' reports neither series nor base"),
                });
            }
        };

        series_from_channel(channel).map_err(|e: ReleaseError| ModelError::Output {
            command: "juju status".to_owned(),
            reason: e.to_string(),
        })
    }

    fn find_unit(&self, unit: &str) -> Option<&UnitStatus> {
        for app in self.applications.values() {
            for (name, status) in &app.units {
                if name == unit {
                    return Some(status);
                }
                if let Some(sub) = status.subordinates.get(unit) {
                    return Some(sub);
                }
            }
        }
        None
    }
}

fn unit_number(unit: &str) -> (String, u64) {
    match unit.rsplit_once('/') {
        Some((app, n)) => (app.to_owned(), n.parse().unwrap_or(u64::MAX)),
        None => (unit.to_owned(), u64::MAX),
    }
}

/// Parses the output of `juju run <unit> <action> --format json` (3.x) or
/// `juju run-action --wait --format json` (2.9).
///
/// Both produce a map keyed by unit (3.x) or unit tag (2.9) holding
/// `status`, `results` and optionally `message`.
pub fn parse_action_output(stdout: &str) -> Result<ActionOutcome, ModelError> {
    const COMMAND: &str = "juju run";

    let value: Value = serde_json::from_str(stdout).map_err(|e| output_error(COMMAND, e))?;
    let (key, entry) = first_entry(&value).ok_or_else(|| ModelError::Output {
        command: COMMAND.to_owned(),
        reason: "empty action result".to_owned(),
    })?;

    let unit = entry
        .get("UnitId")
        .or_else(|| entry.get("unit"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| unit_from_tag(&key));

    let status = entry
        .get("status")
        .and_then(Value::as_str)
        .map(ActionStatus::from_str_loose)
        .ok_or_else(|| ModelError::Output {
            command: COMMAND.to_owned(),
            reason: format!("action result for '{unit}' has no status"),
        })?;

    let results = entry.get("results").cloned().unwrap_or(Value::Null);
    let message = entry
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            results
                .get("Stderr")
                .or_else(|| results.get("stderr"))
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_owned)
        });

    Ok(ActionOutcome {
        unit,
        status,
        results,
        message,
    })
}

/// Recognises the stderr juju prints when an action ran and failed, as
/// opposed to the CLI itself failing.
pub fn action_failure_from_stderr(stderr: &str, unit: &str) -> Option<ActionOutcome> {
    let lowered = stderr.to_lowercase();
    let is_action_failure = lowered.contains("action")
        && (lowered.contains("failed") || lowered.contains("status is \"failed\""));
    if !is_action_failure {
        return None;
    }
    Some(ActionOutcome {
        unit: unit.to_owned(),
        status: ActionStatus::Failed,
        results: Value::Null,
        message: Some(stderr.trim().to_owned()),
    })
}

/// Parses `juju exec --format json` (3.x) and `juju run --format json`
/// (2.9) output into the result for the first unit.
pub fn parse_exec_output(stdout: &str) -> Result<CommandOutcome, ModelError> {
    const COMMAND: &str = "juju exec";

    let value: Value = serde_json::from_str(stdout).map_err(|e| output_error(COMMAND, e))?;
    let (key, entry) = first_entry(&value).ok_or_else(|| ModelError::Output {
        command: COMMAND.to_owned(),
        reason: "empty command result".to_owned(),
    })?;

    let unit = entry
        .get("UnitId")
        .or_else(|| entry.get("unit"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| unit_from_tag(&key));

    // 3.x nests the process result under `results`; 2.9 puts it inline.
    let results = entry.get("results").unwrap_or(entry);
    let code = ["return-code", "Code", "code"]
        .iter()
        .find_map(|k| results.get(*k))
        .and_then(code_from_value)
        .ok_or_else(|| ModelError::Output {
            command: COMMAND.to_owned(),
            reason: format!("command result for '{unit}' has no return code"),
        })?;

    Ok(CommandOutcome {
        unit,
        code,
        stdout: string_field(results, &["stdout", "Stdout"]),
        stderr: string_field(results, &["stderr", "Stderr"]),
    })
}

/// Parses `juju config <app> --format json` into option name -> value.
///
/// Options without a `value` (unset, no default) map to `Value::Null`.
pub fn parse_application_config(stdout: &str) -> Result<BTreeMap<String, Value>, ModelError> {
    const COMMAND: &str = "juju config";

    let value: Value = serde_json::from_str(stdout).map_err(|e| output_error(COMMAND, e))?;
    let settings = value
        .get("settings")
        .and_then(Value::as_object)
        .ok_or_else(|| ModelError::Output {
            command: COMMAND.to_owned(),
            reason: "missing 'settings' object".to_owned(),
        })?;

    Ok(settings
        .iter()
        .map(|(name, option)| {
            let value = option.get("value").cloned().unwrap_or(Value::Null);
            (name.clone(), value)
        })
        .collect())
}

/// Returns the first `(key, entry)` of a map, or of a one-element list.
fn first_entry(value: &Value) -> Option<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().next().map(|(k, v)| (k.clone(), v)),
        Value::Array(items) => items.first().map(|v| (String::new(), v)),
        _ => None,
    }
}

/// `unit-ceph-dashboard-0` -> `ceph-dashboard/0`; unit names pass through.
fn unit_from_tag(key: &str) -> String {
    match key.strip_prefix("unit-") {
        Some(rest) => match rest.rsplit_once('-') {
            Some((app, n)) if n.chars().all(|c| c.is_ascii_digit()) => format!("{app}/{n}"),
            _ => rest.to_owned(),
        },
        None => key.to_owned(),
    }
}

fn code_from_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_field(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| value.get(*k))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn output_error(command: &str, e: serde_json::Error) -> ModelError {
    ModelError::Output {
        command: command.to_owned(),
        reason: e.to_string(),
    }
}
