//! Production [`ModelClient`] implementation that drives the `juju` CLI.
//!
//! Every query runs `juju <subcommand> [-m <model>] ... --format json` and
//! hands stdout to [`crate::parsing`]. Leader targeting uses the
//! `<application>/leader` unit alias.
//!
//! # Examples
//!
//! ```ignore
//! use std::time::Duration;
//! use dashprobe_model::{JujuCliClient, ModelClient};
//!
//! let client = JujuCliClient::new("juju", Some("ceph".to_owned()), Duration::from_secs(300));
//! let units = client.units("ceph-dashboard").await?;
//! # Ok::<(), dashprobe_core::ModelError>(())
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use dashprobe_core::config::ModelConfig;
use dashprobe_core::error::ModelError;
use dashprobe_core::types::{ActionOutcome, CommandOutcome};

use crate::client::ModelClient;
use crate::parsing::{self, ModelStatus};

/// Raw result of one CLI invocation.
#[derive(Debug)]
struct CliOutput {
    code: i32,
    stdout: String,
    stderr: String,
}

/// `juju` CLI client.
///
/// Holds no connection: each call spawns a short-lived `juju` process with
/// `kill_on_drop`, bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct JujuCliClient {
    binary: String,
    model: Option<String>,
    timeout: Duration,
}

impl JujuCliClient {
    /// Creates a client for `binary`, optionally pinned to a model.
    pub fn new(binary: impl Into<String>, model: Option<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            model: model.filter(|m| !m.is_empty()),
            timeout,
        }
    }

    /// Creates a client from the `[model]` config section.
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            config.juju_binary.clone(),
            Some(config.model.clone()),
            config.command_timeout(),
        )
    }

    /// Builds the argument list: subcommand, model flag, then the rest.
    fn args(&self, subcommand: &str, rest: &[String]) -> Vec<String> {
        let mut args = Vec::with_capacity(rest.len() + 3);
        args.push(subcommand.to_owned());
        if let Some(model) = &self.model {
            args.push("-m".to_owned());
            args.push(model.clone());
        }
        args.extend(rest.iter().cloned());
        args
    }

    /// Runs juju and returns its output regardless of exit code.
    async fn invoke(&self, subcommand: &str, rest: &[String]) -> Result<CliOutput, ModelError> {
        let args = self.args(subcommand, rest);
        let rendered = format!("{} {}", self.binary, args.join(" "));
        debug!(command = %rendered, "running juju");

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| ModelError::Timeout {
                command: rendered.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ModelError::Spawn {
                program: self.binary.clone(),
                reason: e.to_string(),
            })?;

        Ok(CliOutput {
            // Killed by a signal: no exit code.
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Runs juju and fails on a non-zero exit code.
    async fn invoke_ok(&self, subcommand: &str, rest: &[String]) -> Result<String, ModelError> {
        let output = self.invoke(subcommand, rest).await?;
        if output.code != 0 {
            return Err(ModelError::CommandFailed {
                command: format!("juju {subcommand}"),
                code: output.code,
                stderr: output.stderr.trim().to_owned(),
            });
        }
        Ok(output.stdout)
    }

    async fn status(&self) -> Result<ModelStatus, ModelError> {
        let stdout = self
            .invoke_ok("status", &["--format".to_owned(), "json".to_owned()])
            .await?;
        ModelStatus::parse(&stdout)
    }
}

fn leader(application: &str) -> String {
    format!("{application}/leader")
}

impl ModelClient for JujuCliClient {
    async fn units(&self, application: &str) -> Result<Vec<String>, ModelError> {
        self.status().await?.units(application)
    }

    async fn unit_public_address(&self, unit: &str) -> Result<String, ModelError> {
        self.status().await?.public_address(unit)
    }

    async fn run_action_on_leader(
        &self,
        application: &str,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ActionOutcome, ModelError> {
        let target = leader(application);
        let mut rest = vec![target.clone(), action.to_owned()];
        rest.extend(params.iter().map(|(k, v)| format!("{k}={v}")));
        rest.extend(["--format".to_owned(), "json".to_owned()]);

        let output = self.invoke("run", &rest).await?;

        // A failed action still prints its result as JSON on most juju
        // versions, with a non-zero exit code.
        match parsing::parse_action_output(&output.stdout) {
            Ok(outcome) => Ok(outcome),
            Err(parse_err) => {
                if output.code != 0 {
                    if let Some(outcome) =
                        parsing::action_failure_from_stderr(&output.stderr, &target)
                    {
                        warn!(unit = %target, action, "action failed without a json result");
                        return Ok(outcome);
                    }
                    return Err(ModelError::CommandFailed {
                        command: format!("juju run {target} {action}"),
                        code: output.code,
                        stderr: output.stderr.trim().to_owned(),
                    });
                }
                Err(parse_err)
            }
        }
    }

    async fn run_on_leader(
        &self,
        application: &str,
        command: &str,
    ) -> Result<CommandOutcome, ModelError> {
        let rest = vec![
            "--unit".to_owned(),
            leader(application),
            "--format".to_owned(),
            "json".to_owned(),
            "--".to_owned(),
            command.to_owned(),
        ];
        let output = self.invoke("exec", &rest).await?;

        // juju exec exits non-zero when the remote command does; the JSON
        // result still carries the real return code.
        match parsing::parse_exec_output(&output.stdout) {
            Ok(outcome) => Ok(outcome),
            Err(_) if output.code != 0 => Err(ModelError::CommandFailed {
                command: format!("juju exec {command}"),
                code: output.code,
                stderr: output.stderr.trim().to_owned(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn application_names(&self) -> Result<Vec<String>, ModelError> {
        Ok(self.status().await?.application_names())
    }

    async fn application_config(
        &self,
        application: &str,
    ) -> Result<BTreeMap<String, serde_json::Value>, ModelError> {
        let stdout = self
            .invoke_ok(
                "config",
                &[
                    application.to_owned(),
                    "--format".to_owned(),
                    "json".to_owned(),
                ],
            )
            .await?;
        parsing::parse_application_config(&stdout)
    }

    async fn set_application_config(
        &self,
        application: &str,
        settings: &BTreeMap<String, String>,
    ) -> Result<(), ModelError> {
        if settings.is_empty() {
            return Ok(());
        }
        let mut rest = vec![application.to_owned()];
        rest.extend(settings.iter().map(|(k, v)| format!("{k}={v}")));
        self.invoke_ok("config", &rest).await?;
        Ok(())
    }

    async fn application_series(&self, application: &str) -> Result<String, ModelError> {
        self.status().await?.series(application)
    }

    async fn scp_from_unit(
        &self,
        unit: &str,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), ModelError> {
        let rest = vec![
            format!("{unit}:{remote_path}"),
            local_path.display().to_string(),
        ];
        self.invoke_ok("scp", &rest).await?;
        Ok(())
    }
}
