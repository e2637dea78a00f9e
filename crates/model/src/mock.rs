//! In-memory [`ModelClient`] for tests.
//!
//! Responses are configured up front with `with_*` builders. Actions and
//! commands go to optional handler closures; every mutating call is recorded
//! so tests can assert on what the scenarios asked the model to do.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use dashprobe_core::error::ModelError;
use dashprobe_core::types::{ActionOutcome, ActionStatus, CommandOutcome};

use crate::client::ModelClient;

/// Handler for `run_action_on_leader`: `(application, action, params)`.
pub type ActionHandler =
    Arc<dyn Fn(&str, &str, &BTreeMap<String, String>) -> ActionOutcome + Send + Sync>;

/// Handler for `run_on_leader`: `(application, command)`.
pub type CommandHandler = Arc<dyn Fn(&str, &str) -> CommandOutcome + Send + Sync>;

/// An action invocation seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAction {
    pub application: String,
    pub action: String,
    pub params: BTreeMap<String, String>,
}

/// Mock orchestration model.
#[derive(Default)]
pub struct MockModelClient {
    /// application -> ordered `(unit, address)` pairs
    units: BTreeMap<String, Vec<(String, String)>>,
    /// applications present without units of their own
    applications: BTreeSet<String>,
    series: BTreeMap<String, String>,
    /// `unit:remote_path` -> file content
    files: BTreeMap<String, String>,
    action_handler: Option<ActionHandler>,
    command_handler: Option<CommandHandler>,
    config: Mutex<BTreeMap<String, BTreeMap<String, Value>>>,
    actions: Mutex<Vec<RecordedAction>>,
    commands: Mutex<Vec<(String, String)>>,
    config_sets: Mutex<Vec<(String, BTreeMap<String, String>)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockModelClient {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `application` with units `<application>/0..n` at the given addresses.
    pub fn with_units<I, S>(mut self, application: &str, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let units = addresses
            .into_iter()
            .enumerate()
            .map(|(n, addr)| (format!("{application}/{n}"), addr.into()))
            .collect();
        self.units.insert(application.to_owned(), units);
        self
    }

    /// Adds applications that have no units in the mock.
    pub fn with_applications<I, S>(mut self, applications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applications
            .extend(applications.into_iter().map(Into::into));
        self
    }

    /// Sets the series reported for `application`.
    pub fn with_series(mut self, application: &str, series: &str) -> Self {
        self.series.insert(application.to_owned(), series.to_owned());
        self.applications.insert(application.to_owned());
        self
    }

    /// Seeds one config option of `application`.
    pub fn with_config(self, application: &str, key: &str, value: impl Into<Value>) -> Self {
        lock(&self.config)
            .entry(application.to_owned())
            .or_default()
            .insert(key.to_owned(), value.into());
        self
    }

    /// Makes `scp_from_unit(unit, remote_path, _)` write `content`.
    pub fn with_file(mut self, unit: &str, remote_path: &str, content: &str) -> Self {
        self.files
            .insert(format!("{unit}:{remote_path}"), content.to_owned());
        self
    }

    /// Routes actions to `handler`. Without one, actions complete with no results.
    pub fn with_action_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &str, &BTreeMap<String, String>) -> ActionOutcome + Send + Sync + 'static,
    {
        self.action_handler = Some(Arc::new(handler));
        self
    }

    /// Routes commands to `handler`. Without one, commands exit 0.
    pub fn with_command_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &str) -> CommandOutcome + Send + Sync + 'static,
    {
        self.command_handler = Some(Arc::new(handler));
        self
    }

    /// Actions run so far, in order.
    pub fn recorded_actions(&self) -> Vec<RecordedAction> {
        lock(&self.actions).clone()
    }

    /// Commands run so far as `(application, command)`, in order.
    pub fn recorded_commands(&self) -> Vec<(String, String)> {
        lock(&self.commands).clone()
    }

    /// `set_application_config` calls so far, in order.
    pub fn recorded_config_sets(&self) -> Vec<(String, BTreeMap<String, String>)> {
        lock(&self.config_sets).clone()
    }

    fn has_application(&self, application: &str) -> bool {
        self.units.contains_key(application) || self.applications.contains(application)
    }

    fn require_application(&self, application: &str) -> Result<(), ModelError> {
        if self.has_application(application) {
            Ok(())
        } else {
            Err(ModelError::ApplicationNotFound(application.to_owned()))
        }
    }

    fn leader_unit(&self, application: &str) -> String {
        self.units
            .get(application)
            .and_then(|units| units.first())
            .map(|(unit, _)| unit.clone())
            .unwrap_or_else(|| format!("{application}/0"))
    }
}

impl ModelClient for MockModelClient {
    async fn units(&self, application: &str) -> Result<Vec<String>, ModelError> {
        self.require_application(application)?;
        Ok(self
            .units
            .get(application)
            .map(|units| units.iter().map(|(unit, _)| unit.clone()).collect())
            .unwrap_or_default())
    }

    async fn unit_public_address(&self, unit: &str) -> Result<String, ModelError> {
        self.units
            .values()
            .flatten()
            .find(|(name, _)| name == unit)
            .map(|(_, addr)| addr.clone())
            .ok_or_else(|| ModelError::UnitNotFound(unit.to_owned()))
    }

    async fn run_action_on_leader(
        &self,
        application: &str,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ActionOutcome, ModelError> {
        self.require_application(application)?;
        lock(&self.actions).push(RecordedAction {
            application: application.to_owned(),
            action: action.to_owned(),
            params: params.clone(),
        });
        Ok(match &self.action_handler {
            Some(handler) => handler(application, action, params),
            None => ActionOutcome {
                unit: self.leader_unit(application),
                status: ActionStatus::Completed,
                results: Value::Object(serde_json::Map::new()),
                message: None,
            },
        })
    }

    async fn run_on_leader(
        &self,
        application: &str,
        command: &str,
    ) -> Result<CommandOutcome, ModelError> {
        self.require_application(application)?;
        lock(&self.commands).push((application.to_owned(), command.to_owned()));
        Ok(match &self.command_handler {
            Some(handler) => handler(application, command),
            None => CommandOutcome {
                unit: self.leader_unit(application),
                code: 0,
                stdout: String::new(),
                stderr: String::new(),
            },
        })
    }

    async fn application_names(&self) -> Result<Vec<String>, ModelError> {
        let mut names: BTreeSet<String> = self.units.keys().cloned().collect();
        names.extend(self.applications.iter().cloned());
        Ok(names.into_iter().collect())
    }

    async fn application_config(
        &self,
        application: &str,
    ) -> Result<BTreeMap<String, Value>, ModelError> {
        self.require_application(application)?;
        Ok(lock(&self.config)
            .get(application)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_application_config(
        &self,
        application: &str,
        settings: &BTreeMap<String, String>,
    ) -> Result<(), ModelError> {
        self.require_application(application)?;
        lock(&self.config_sets).push((application.to_owned(), settings.clone()));
        let mut config = lock(&self.config);
        let entry = config.entry(application.to_owned()).or_default();
        for (key, value) in settings {
            entry.insert(key.clone(), Value::from(value.as_str()));
        }
        Ok(())
    }

    async fn application_series(&self, application: &str) -> Result<String, ModelError> {
        self.require_application(application)?;
        self.series
            .get(application)
            .cloned()
            .ok_or_else(|| ModelError::Output {
                command: "mock status".to_owned(),
                reason: format!("no series configured for '{application}'"),
            })
    }

    async fn scp_from_unit(
        &self,
        unit: &str,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), ModelError> {
        let content = self
            .files
            .get(&format!("{unit}:{remote_path}"))
            .ok_or_else(|| ModelError::CommandFailed {
                command: format!("juju scp {unit}:{remote_path}"),
                code: 1,
                stderr: format!("{remote_path}: No such file or directory"),
            })?;
        tokio::fs::write(local_path, content)
            .await
            .map_err(|e| ModelError::Output {
                command: "mock scp".to_owned(),
                reason: e.to_string(),
            })
    }
}
